//! Mock composer API for testing
//!
//! Scriptable stand-in for the remote backend. Every call is counted and
//! appended to a shared call log, so tests can assert both *whether* an
//! operation ran and *in which order* (e.g. publish never precedes create).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::{
    ApiResponse, ComposerApi, CreatePostPayload, CreatedPost, GenerateContentRequest,
    GeneratedContent, HashtagRequest, HashtagSuggestions, MentionRequest, MentionSuggestions,
    PlatformContent, PublishResult,
};
use crate::error::ApiError;
use crate::media::{LocalFile, RemoteMedia};
use crate::platforms::ConnectedPlatform;

/// How the mock answers `publish_post`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishBehavior {
    Succeed,
    /// 2xx response with `success: false`
    Reject(String),
    /// Transport or HTTP failure
    Fail(ApiError),
}

/// One recorded call, in issue order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Upload(usize),
    Create,
    Publish(String),
    Generate,
    SuggestHashtags,
    SuggestMentions,
    FetchAccounts,
}

/// Configuration for mock API behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Error returned by every upload
    pub upload_error: Option<ApiError>,

    /// When set, uploads return this many items regardless of input
    pub upload_item_count: Option<usize>,

    /// Error returned by every create
    pub create_error: Option<ApiError>,

    pub publish: PublishBehavior,

    /// Canned generator response; `None` echoes the prompt per platform
    pub generated: Option<ApiResponse<GeneratedContent>>,

    pub hashtags: ApiResponse<HashtagSuggestions>,

    pub mentions: ApiResponse<MentionSuggestions>,

    pub accounts: Vec<ConnectedPlatform>,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    pub upload_call_count: Arc<Mutex<usize>>,

    pub create_call_count: Arc<Mutex<usize>>,

    pub publish_call_count: Arc<Mutex<usize>>,

    /// Payloads passed to `create_post` (for verification)
    pub created_payloads: Arc<Mutex<Vec<CreatePostPayload>>>,

    /// Names of uploaded files, one entry per batch
    pub uploaded_batches: Arc<Mutex<Vec<Vec<String>>>>,

    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            upload_error: None,
            upload_item_count: None,
            create_error: None,
            publish: PublishBehavior::Succeed,
            generated: None,
            hashtags: ApiResponse::ok(HashtagSuggestions::default()),
            mentions: ApiResponse::ok(MentionSuggestions::default()),
            accounts: Vec::new(),
            delay: Duration::from_millis(0),
            upload_call_count: Arc::new(Mutex::new(0)),
            create_call_count: Arc::new(Mutex::new(0)),
            publish_call_count: Arc::new(Mutex::new(0)),
            created_payloads: Arc::new(Mutex::new(Vec::new())),
            uploaded_batches: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock backend for testing
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    config: MockConfig,
}

impl MockApi {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock backend where every call succeeds
    pub fn success() -> Self {
        Self::default()
    }

    /// Create a mock backend whose uploads fail
    pub fn upload_failure(error: ApiError) -> Self {
        Self::new(MockConfig {
            upload_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock backend whose create call fails
    pub fn create_failure(error: ApiError) -> Self {
        Self::new(MockConfig {
            create_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock backend that creates posts but cannot publish them
    pub fn publish_failure(behavior: PublishBehavior) -> Self {
        Self::new(MockConfig {
            publish: behavior,
            ..Default::default()
        })
    }

    /// Create a mock backend with a delay
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn upload_calls(&self) -> usize {
        *self.config.upload_call_count.lock().unwrap()
    }

    pub fn create_calls(&self) -> usize {
        *self.config.create_call_count.lock().unwrap()
    }

    pub fn publish_calls(&self) -> usize {
        *self.config.publish_call_count.lock().unwrap()
    }

    pub fn created_payloads(&self) -> Vec<CreatePostPayload> {
        self.config.created_payloads.lock().unwrap().clone()
    }

    pub fn uploaded_batches(&self) -> Vec<Vec<String>> {
        self.config.uploaded_batches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.config.calls.lock().unwrap().clone()
    }

    async fn simulate_delay(&self) {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
    }

    fn record(&self, call: MockCall) {
        self.config.calls.lock().unwrap().push(call);
    }

    fn bump(counter: &Arc<Mutex<usize>>) -> usize {
        let mut count = counter.lock().unwrap();
        *count += 1;
        *count
    }
}

#[async_trait]
impl ComposerApi for MockApi {
    async fn upload_media(&self, files: &[LocalFile]) -> Result<Vec<RemoteMedia>, ApiError> {
        Self::bump(&self.config.upload_call_count);
        self.record(MockCall::Upload(files.len()));
        self.config
            .uploaded_batches
            .lock()
            .unwrap()
            .push(files.iter().map(|f| f.name.clone()).collect());
        self.simulate_delay().await;

        if let Some(error) = &self.config.upload_error {
            return Err(error.clone());
        }

        let count = self.config.upload_item_count.unwrap_or(files.len());
        Ok(files
            .iter()
            .cycle()
            .take(count)
            .map(|file| RemoteMedia {
                secure_url: Some(format!("https://cdn.example.com/{}", file.name)),
                public_id: Some(format!("media/{}", file.name)),
                original_name: Some(file.name.clone()),
                size: Some(file.size),
                ..Default::default()
            })
            .collect())
    }

    async fn create_post(&self, payload: &CreatePostPayload) -> Result<CreatedPost, ApiError> {
        let n = Self::bump(&self.config.create_call_count);
        self.record(MockCall::Create);
        self.config
            .created_payloads
            .lock()
            .unwrap()
            .push(payload.clone());
        self.simulate_delay().await;

        if let Some(error) = &self.config.create_error {
            return Err(error.clone());
        }
        Ok(CreatedPost {
            id: format!("post-{}", n),
        })
    }

    async fn publish_post(&self, post_id: &str) -> Result<PublishResult, ApiError> {
        Self::bump(&self.config.publish_call_count);
        self.record(MockCall::Publish(post_id.to_string()));
        self.simulate_delay().await;

        match &self.config.publish {
            PublishBehavior::Succeed => Ok(PublishResult {
                success: true,
                message: None,
            }),
            PublishBehavior::Reject(message) => Ok(PublishResult {
                success: false,
                message: Some(message.clone()),
            }),
            PublishBehavior::Fail(error) => Err(error.clone()),
        }
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ApiResponse<GeneratedContent>, ApiError> {
        self.record(MockCall::Generate);
        self.simulate_delay().await;

        if let Some(canned) = &self.config.generated {
            return Ok(canned.clone());
        }
        let content: BTreeMap<_, _> = request
            .platforms
            .iter()
            .map(|platform| {
                let text = format!("{} #{}", request.prompt, platform);
                (
                    platform.clone(),
                    PlatformContent {
                        character_count: text.chars().count(),
                        content: text,
                        within_limit: true,
                    },
                )
            })
            .collect();
        Ok(ApiResponse::ok(GeneratedContent {
            content,
            options: None,
        }))
    }

    async fn suggest_hashtags(
        &self,
        _request: &HashtagRequest,
    ) -> Result<ApiResponse<HashtagSuggestions>, ApiError> {
        self.record(MockCall::SuggestHashtags);
        self.simulate_delay().await;
        Ok(self.config.hashtags.clone())
    }

    async fn suggest_mentions(
        &self,
        _request: &MentionRequest,
    ) -> Result<ApiResponse<MentionSuggestions>, ApiError> {
        self.record(MockCall::SuggestMentions);
        self.simulate_delay().await;
        Ok(self.config.mentions.clone())
    }

    async fn fetch_accounts(&self) -> Result<Vec<ConnectedPlatform>, ApiError> {
        self.record(MockCall::FetchAccounts);
        self.simulate_delay().await;
        Ok(self.config.accounts.clone())
    }
}
