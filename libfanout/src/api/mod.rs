//! Remote composer API
//!
//! The core only talks to the outside world through [`ComposerApi`]: batch
//! media upload, post creation, publishing, AI generation and the list of
//! connected accounts. [`http::HttpApi`] is the real implementation;
//! [`mock::MockApi`] is a scriptable in-process one for tests.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::media::{LocalFile, RemoteMedia};
use crate::platforms::ConnectedPlatform;
use crate::types::{AccountId, FileType, PlatformId, PostMetadata};

pub mod http;

// Mock API is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Operations the compose core needs from the backend
#[async_trait]
pub trait ComposerApi: Send + Sync {
    /// Upload one batch; the response order matches `files`
    async fn upload_media(&self, files: &[LocalFile]) -> Result<Vec<RemoteMedia>, ApiError>;

    /// Persist a post and return its id
    async fn create_post(&self, payload: &CreatePostPayload) -> Result<CreatedPost, ApiError>;

    /// Dispatch a created post to its platforms
    async fn publish_post(&self, post_id: &str) -> Result<PublishResult, ApiError>;

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ApiResponse<GeneratedContent>, ApiError>;

    async fn suggest_hashtags(
        &self,
        request: &HashtagRequest,
    ) -> Result<ApiResponse<HashtagSuggestions>, ApiError>;

    async fn suggest_mentions(
        &self,
        request: &MentionRequest,
    ) -> Result<ApiResponse<MentionSuggestions>, ApiError>;

    async fn fetch_accounts(&self) -> Result<Vec<ConnectedPlatform>, ApiError>;
}

/// Credentials for one signed-in user, passed explicitly to the client
pub struct ApiSession {
    pub base_url: String,
    pub token: SecretString,
}

impl fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSession")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ApiSession {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: SecretString::from(token.into()),
        }
    }
}

/// `{ "data": ... }` wrapper used by most endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `{ "success": ..., "data": ..., "message": ... }` wrapper of the AI endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Server-side state requested at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Scheduled,
}

/// Body of the create-post call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostPayload {
    pub content: String,
    pub platforms: Vec<PlatformId>,
    pub selected_accounts: BTreeMap<PlatformId, Vec<AccountId>>,
    pub images: Vec<WireMedia>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub metadata: PostMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
}

/// One media item as the backend expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMedia {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    pub original_name: String,
    pub display_name: String,
    pub filename: String,
    pub file_type: FileType,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Position in the carousel, starting at 0
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Friendly,
    Enthusiastic,
    Informative,
    Humorous,
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "friendly" => Ok(Tone::Friendly),
            "enthusiastic" => Ok(Tone::Enthusiastic),
            "informative" => Ok(Tone::Informative),
            "humorous" => Ok(Tone::Humorous),
            _ => Err(format!(
                "Invalid tone: '{}'. Valid options: professional, casual, friendly, enthusiastic, informative, humorous",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub prompt: String,
    pub tone: Tone,
    pub platforms: Vec<PlatformId>,
    pub include_hashtags: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub content: BTreeMap<PlatformId, PlatformContent>,
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContent {
    pub content: String,
    #[serde(default)]
    pub character_count: usize,
    #[serde(default = "default_true")]
    pub within_limit: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagRequest {
    pub content: String,
    pub platform: PlatformId,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagSuggestions {
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    Influencers,
    Brands,
    Experts,
    Communities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionRequest {
    pub content: String,
    pub platform: PlatformId,
    pub count: usize,
    pub mention_types: Vec<MentionKind>,
    pub verified_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionSuggestions {
    pub mentions: Vec<String>,
}
