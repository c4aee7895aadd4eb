//! Error types for Fanout

use std::fmt;

use thiserror::Error;

use crate::types::PlatformId;

pub type Result<T> = std::result::Result<T, FanoutError>;

#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Submit failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FanoutError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FanoutError::InvalidInput(_) | FanoutError::Validation(_) => 3,
            FanoutError::Api(ApiError::Unauthorized(_)) => 2,
            FanoutError::Submit(SubmitError::CreateFailed(ApiError::Unauthorized(_))) => 2,
            FanoutError::Submit(SubmitError::CreatedNotPublished { .. }) => 4,
            FanoutError::Config(_)
            | FanoutError::Api(_)
            | FanoutError::Upload(_)
            | FanoutError::Enrichment(_)
            | FanoutError::Submit(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failures talking to the remote composer API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// A single local, pre-network validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Content cannot be empty")]
    EmptyContent,

    #[error("Select at least one platform")]
    NoPlatformSelected,

    #[error("At least one image or video is required")]
    MediaRequired,

    #[error("Select at least one account for {platform}")]
    AccountRequired { platform: PlatformId },

    #[error("Content length ({length} characters) exceeds the {platform} limit of {limit} characters")]
    ContentTooLong {
        platform: PlatformId,
        length: usize,
        limit: usize,
    },

    #[error("Content length ({length} characters) exceeds the default limit of {limit} characters")]
    ContentExceedsDefaultLimit { length: usize, limit: usize },

    #[error("A scheduled post needs a date")]
    ScheduleDateMissing,

    #[error("A scheduled post needs a time")]
    ScheduleTimeMissing,

    #[error("Invalid schedule time '{0}' (expected HH:MM)")]
    InvalidScheduleTime(String),
}

/// Every violation found in one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Batch-scoped media upload failure; the batch's local previews are rolled back
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("upload of batch {batch} failed: {source}")]
    Failed { batch: u64, source: ApiError },

    #[error("upload of batch {batch} returned {received} items for {expected} files")]
    IncompleteResponse {
        batch: u64,
        expected: usize,
        received: usize,
    },

    #[error("no acceptable files in upload")]
    NothingToUpload,
}

/// Releasing a local preview URL failed; logged, never surfaced to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob url {0} is not live (already released?)")]
    NotLive(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("generator reported failure: {0}")]
    Unsuccessful(String),

    #[error("generator returned no suggestions")]
    Empty,
}

/// Which half of the two-phase submit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Create,
    Publish,
}

impl fmt::Display for SubmitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitPhase::Create => write!(f, "create"),
            SubmitPhase::Publish => write!(f, "publish"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No remote record exists
    #[error("post could not be created: {0}")]
    CreateFailed(ApiError),

    /// The record exists remotely but is not live
    #[error("post {post_id} was created but not published: {reason}")]
    CreatedNotPublished { post_id: String, reason: String },
}

impl SubmitError {
    pub fn phase(&self) -> SubmitPhase {
        match self {
            SubmitError::CreateFailed(_) => SubmitPhase::Create,
            SubmitError::CreatedNotPublished { .. } => SubmitPhase::Publish,
        }
    }

    /// Remote id left behind by a partial success
    pub fn created_post_id(&self) -> Option<&str> {
        match self {
            SubmitError::CreateFailed(_) => None,
            SubmitError::CreatedNotPublished { post_id, .. } => Some(post_id),
        }
    }
}
