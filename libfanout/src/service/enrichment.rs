//! AI content, hashtag and mention suggestions
//!
//! Pure request/response over [`ComposerApi`]. The only state kept is the
//! last set of generated suggestions. Any failure is returned to the caller
//! and leaves the draft untouched.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::api::{
    ApiResponse, ComposerApi, GenerateContentRequest, HashtagRequest, MentionKind, MentionRequest,
    Tone,
};
use crate::draft::{Draft, DraftAction};
use crate::error::EnrichmentError;
use crate::text;
use crate::types::PlatformId;

/// Generated text for one platform, with hashtags already pulled out of the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub platform: PlatformId,
    pub content: String,
    pub hashtags: Vec<String>,
    pub character_count: usize,
    pub within_limit: bool,
}

/// Parameters of a content generation request
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub tone: Tone,
    pub include_hashtags: bool,
    pub max_length: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            include_hashtags: true,
            max_length: None,
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentService {
    api: Arc<dyn ComposerApi>,
    last: Arc<Mutex<Vec<Suggestion>>>,
}

impl EnrichmentService {
    pub fn new(api: Arc<dyn ComposerApi>) -> Self {
        Self {
            api,
            last: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// One suggestion per requested platform the generator answered for
    pub async fn generate_content(
        &self,
        prompt: &str,
        platforms: &[PlatformId],
        options: &GenerateOptions,
    ) -> Result<Vec<Suggestion>, EnrichmentError> {
        let request = GenerateContentRequest {
            prompt: prompt.to_string(),
            tone: options.tone,
            platforms: platforms.to_vec(),
            include_hashtags: options.include_hashtags,
            max_length: options.max_length,
        };
        let mut generated = unwrap_response(self.api.generate_content(&request).await?)?;

        let suggestions: Vec<Suggestion> = platforms
            .iter()
            .filter_map(|platform| {
                let raw = generated.content.remove(platform)?;
                let extracted = text::extract_hashtags(&raw.content);
                Some(Suggestion {
                    platform: platform.clone(),
                    character_count: extracted.content.chars().count(),
                    content: extracted.content,
                    hashtags: extracted.hashtags,
                    within_limit: raw.within_limit,
                })
            })
            .collect();

        if suggestions.is_empty() {
            return Err(EnrichmentError::Empty);
        }
        debug!("Generated {} suggestion(s)", suggestions.len());

        if let Ok(mut last) = self.last.lock() {
            *last = suggestions.clone();
        }
        Ok(suggestions)
    }

    /// Suggestions from the most recent successful generation
    pub fn last_suggestions(&self) -> Vec<Suggestion> {
        self.last.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Replace content, hashtags and platform scope with `suggestion`
    pub fn apply_suggestion(&self, draft: &mut Draft, suggestion: &Suggestion) {
        draft.apply(DraftAction::ApplySuggestion {
            content: suggestion.content.clone(),
            hashtags: suggestion.hashtags.clone(),
            platforms: vec![suggestion.platform.clone()],
        });
    }

    pub async fn suggest_hashtags(
        &self,
        content: &str,
        platform: &PlatformId,
        count: usize,
    ) -> Result<Vec<String>, EnrichmentError> {
        let request = HashtagRequest {
            content: content.to_string(),
            platform: platform.clone(),
            count,
        };
        let data = unwrap_response(self.api.suggest_hashtags(&request).await?)?;
        Ok(data.hashtags)
    }

    pub async fn suggest_mentions(
        &self,
        content: &str,
        platform: &PlatformId,
        count: usize,
        kinds: &[MentionKind],
        verified_only: bool,
    ) -> Result<Vec<String>, EnrichmentError> {
        let request = MentionRequest {
            content: content.to_string(),
            platform: platform.clone(),
            count,
            mention_types: kinds.to_vec(),
            verified_only,
        };
        let data = unwrap_response(self.api.suggest_mentions(&request).await?)?;
        Ok(data.mentions)
    }

    /// Ask for hashtags for the draft's content and append them
    ///
    /// Returns how many tags were appended. Existing tags are kept and
    /// duplicates are not removed.
    pub async fn add_suggested_hashtags(
        &self,
        draft: &mut Draft,
        platform: &PlatformId,
        count: usize,
    ) -> Result<usize, EnrichmentError> {
        let tags = self
            .suggest_hashtags(draft.content(), platform, count)
            .await?;
        let before = draft.hashtags().len();
        draft.apply(DraftAction::AppendHashtags(tags));
        Ok(draft.hashtags().len() - before)
    }

    pub async fn add_suggested_mentions(
        &self,
        draft: &mut Draft,
        platform: &PlatformId,
        count: usize,
        kinds: &[MentionKind],
    ) -> Result<usize, EnrichmentError> {
        let mentions = self
            .suggest_mentions(draft.content(), platform, count, kinds, false)
            .await?;
        let before = draft.mentions().len();
        draft.apply(DraftAction::AppendMentions(mentions));
        Ok(draft.mentions().len() - before)
    }
}

fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, EnrichmentError> {
    if !response.success {
        let message = response
            .message
            .unwrap_or_else(|| "no reason given".to_string());
        warn!("Generator reported failure: {}", message);
        return Err(EnrichmentError::Unsuccessful(message));
    }
    response.data.ok_or(EnrichmentError::Empty)
}
