//! Service layer for Fanout
//!
//! Front ends (the CLI today) talk to the compose core through
//! [`FanoutService`], a facade that owns the shared collaborators and hands
//! out the specialized sub-services:
//!
//! - `UploadService`: batch media upload with rollback
//! - `EnrichmentService`: AI content, hashtag and mention suggestions
//! - `PublishService`: validation and two-phase submit
//! - `EventBus`: progress event distribution
//!
//! # Example
//!
//! ```no_run
//! use libfanout::draft::DraftAction;
//! use libfanout::service::FanoutService;
//! use libfanout::types::{AccountId, PlatformId};
//!
//! # async fn example() -> libfanout::Result<()> {
//! let service = FanoutService::new()?;
//! let mut draft = service.new_draft();
//!
//! draft.apply(DraftAction::SetContent("Hello from every network".to_string()));
//! draft.apply(DraftAction::SelectPlatform(PlatformId::new("twitter")));
//! draft.apply(DraftAction::SelectAccount {
//!     platform: PlatformId::new("twitter"),
//!     account: AccountId::new("main"),
//! });
//!
//! let outcome = service.publisher().submit(&mut draft).await?;
//! println!("Posted as {}", outcome.post_id);
//! # Ok(())
//! # }
//! ```

pub mod enrichment;
pub mod events;
pub mod payload;
pub mod publish;
pub mod upload;

use std::sync::Arc;

use self::enrichment::EnrichmentService;
use self::events::EventBus;
use self::publish::PublishService;
use self::upload::UploadService;
use crate::api::http::HttpApi;
use crate::api::ComposerApi;
use crate::draft::{Draft, DraftAction};
use crate::media::{BlobStore, MediaLimits, MemoryBlobStore};
use crate::platforms::{ConnectedPlatform, ConstraintTable};
use crate::types::PlatformId;
use crate::validation::Validator;
use crate::{Config, Result};

/// Main service facade that coordinates all sub-services
///
/// All sub-services share the same `Arc<dyn ComposerApi>`, constraint table
/// and event bus.
pub struct FanoutService {
    config: Arc<Config>,
    api: Arc<dyn ComposerApi>,
    blobs: Arc<dyn BlobStore>,
    validator: Validator,
    uploads: UploadService,
    enrichment: EnrichmentService,
    publisher: PublishService,
    event_bus: EventBus,
}

impl FanoutService {
    /// Create a service from the default configuration file
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service talking to the configured HTTP backend
    ///
    /// # Errors
    ///
    /// Returns an error if no API token can be resolved or the HTTP client
    /// cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let token = config.api_token()?;
        let api = HttpApi::from_config(&config.api, token)?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Create a service over any [`ComposerApi`] (e.g. the mock in tests)
    pub fn with_api(config: Config, api: Arc<dyn ComposerApi>) -> Self {
        let constraints = Arc::new(ConstraintTable::from_config(&config));
        let validator = Validator::new(constraints);
        let event_bus = EventBus::new(100);

        let uploads = UploadService::new(Arc::clone(&api), event_bus.clone());
        let enrichment = EnrichmentService::new(Arc::clone(&api));
        let publisher = PublishService::new(Arc::clone(&api), validator.clone(), event_bus.clone());

        Self {
            config: Arc::new(config),
            api,
            blobs: Arc::new(MemoryBlobStore::new()),
            validator,
            uploads,
            enrichment,
            publisher,
            event_bus,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn constraints(&self) -> &ConstraintTable {
        self.validator.constraints()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn uploads(&self) -> &UploadService {
        &self.uploads
    }

    pub fn enrichment(&self) -> &EnrichmentService {
        &self.enrichment
    }

    pub fn publisher(&self) -> &PublishService {
        &self.publisher
    }

    /// Empty draft pre-filled with the configured default platforms and category
    pub fn new_draft(&self) -> Draft {
        let mut draft = Draft::new(
            Arc::clone(&self.blobs),
            MediaLimits::from(&self.config.media),
        );
        let defaults = &self.config.defaults;
        if !defaults.platforms.is_empty() {
            draft.apply(DraftAction::SetPlatforms(
                defaults.platforms.iter().map(PlatformId::new).collect(),
            ));
        }
        draft.apply(DraftAction::SetCategory(defaults.category.clone()));
        draft
    }

    /// Platforms and accounts the user has connected (read-only)
    pub async fn connected_accounts(&self) -> Result<Vec<ConnectedPlatform>> {
        Ok(self.api.fetch_accounts().await?)
    }

    /// Subscribe to service events
    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }
}
