//! reqwest-backed [`ComposerApi`]
//!
//! Every call is a single request. Nothing is retried here: retry decisions
//! belong to the caller, which knows which phase of a submit failed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    ApiResponse, ApiSession, ComposerApi, CreatePostPayload, CreatedPost, Envelope,
    GenerateContentRequest, GeneratedContent, HashtagRequest, HashtagSuggestions, MentionRequest,
    MentionSuggestions, PublishResult,
};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::media::{LocalFile, RemoteMedia};
use crate::platforms::ConnectedPlatform;

/// Multipart field carrying the files of an upload batch
const UPLOAD_FIELD: &str = "files";

pub struct HttpApi {
    client: Client,
    session: ApiSession,
}

impl HttpApi {
    pub fn new(session: ApiSession, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fanout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, session })
    }

    /// Client for the configured backend using an already-resolved token
    pub fn from_config(config: &ApiConfig, token: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(
            ApiSession::new(&config.base_url, token),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.session.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.session.base_url, endpoint)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.session.token.expose_secret())
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(endpoint))
            .header("Authorization", self.bearer())
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .header("Authorization", self.bearer())
            .send()
            .await?;
        decode(response).await
    }
}

/// Map the status line first, then parse the body
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(|e| ApiError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        _ => ApiError::Http {
            status: status.as_u16(),
            message,
        },
    })
}

/// Pull `message` or `error` out of a JSON error body, falling back to raw text
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message.or(parsed.error),
        Err(_) => Some(body.chars().take(200).collect()),
    }
}

/// The accounts endpoint answers either with a bare list or an envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum AccountsBody {
    Wrapped(Envelope<Vec<ConnectedPlatform>>),
    Bare(Vec<ConnectedPlatform>),
}

#[async_trait]
impl ComposerApi for HttpApi {
    #[instrument(skip(self, files), fields(count = files.len()))]
    async fn upload_media(&self, files: &[LocalFile]) -> Result<Vec<RemoteMedia>, ApiError> {
        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.data.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| ApiError::Rejected(format!("{}: {}", file.name, e)))?;
            form = form.part(UPLOAD_FIELD, part);
        }

        let response = self
            .client
            .post(self.url("/media/upload"))
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await?;
        let body: Envelope<Vec<RemoteMedia>> = decode(response).await?;
        debug!("Upload returned {} item(s)", body.data.len());
        Ok(body.data)
    }

    #[instrument(skip(self, payload), fields(platforms = payload.platforms.len()))]
    async fn create_post(&self, payload: &CreatePostPayload) -> Result<CreatedPost, ApiError> {
        let body: Envelope<CreatedPost> = self.post_json("/posts", payload).await?;
        debug!("Created post {}", body.data.id);
        Ok(body.data)
    }

    #[instrument(skip(self))]
    async fn publish_post(&self, post_id: &str) -> Result<PublishResult, ApiError> {
        self.post_json(&publish_endpoint(post_id), &serde_json::json!({}))
            .await
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ApiResponse<GeneratedContent>, ApiError> {
        self.post_json("/ai/generate-content", request).await
    }

    async fn suggest_hashtags(
        &self,
        request: &HashtagRequest,
    ) -> Result<ApiResponse<HashtagSuggestions>, ApiError> {
        self.post_json("/ai/suggest-hashtags", request).await
    }

    async fn suggest_mentions(
        &self,
        request: &MentionRequest,
    ) -> Result<ApiResponse<MentionSuggestions>, ApiError> {
        self.post_json("/ai/suggest-mentions", request).await
    }

    async fn fetch_accounts(&self) -> Result<Vec<ConnectedPlatform>, ApiError> {
        let body: AccountsBody = self.get_json("/accounts").await?;
        Ok(match body {
            AccountsBody::Wrapped(envelope) => envelope.data,
            AccountsBody::Bare(list) => list,
        })
    }
}

/// Post ids are opaque and go into the path as a single segment
fn publish_endpoint(post_id: &str) -> String {
    format!("/posts/{}/publish", urlencoding::encode(post_id))
}
