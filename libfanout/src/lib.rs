//! Fanout - compose once, post to many social networks
//!
//! This library holds the compose core: the in-memory draft, per-platform
//! validation, the media upload pipeline, AI enrichment and the two-phase
//! create/publish orchestration against a remote composer API.

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod logging;
pub mod media;
pub mod platforms;
pub mod scheduling;
pub mod service;
pub mod text;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use draft::{Draft, DraftAction};
pub use error::{FanoutError, Result};
pub use service::FanoutService;
pub use types::{AccountId, DraftStatus, PlatformId, Schedule};
