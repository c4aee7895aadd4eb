//! Publish orchestration
//!
//! Drives a draft through `composing -> validating -> submitting` and on to
//! `published`, `scheduled` or a recoverable failure.
//!
//! Immediate posts use a two-phase submit: create, then publish with the id
//! create returned. Publish is never issued unless create succeeded, and a
//! failed publish is reported as [`SubmitError::CreatedNotPublished`] so the
//! caller knows a record exists remotely. Nothing is retried or rolled back
//! automatically; [`PublishService::retry_publish`] is the explicit way to
//! try the publish phase again.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::events::{Event, EventBus};
use super::payload::build_payload;
use crate::api::{ComposerApi, RecordStatus};
use crate::draft::Draft;
use crate::error::{
    FanoutError, Result, SubmitError, SubmitPhase, ValidationError, ValidationErrors,
};
use crate::platforms::ConstraintTable;
use crate::types::DraftStatus;
use crate::validation::Validator;

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub post_id: String,
    /// `Published` or `Scheduled`
    pub status: DraftStatus,
    /// UTC timestamp sent as `scheduledDate`
    pub scheduled_at: Option<String>,
}

#[derive(Clone)]
pub struct PublishService {
    api: Arc<dyn ComposerApi>,
    validator: Validator,
    event_bus: EventBus,
}

impl PublishService {
    pub fn new(api: Arc<dyn ComposerApi>, validator: Validator, event_bus: EventBus) -> Self {
        Self {
            api,
            validator,
            event_bus,
        }
    }

    fn constraints(&self) -> &ConstraintTable {
        self.validator.constraints()
    }

    /// Validate, serialize and submit `draft`
    ///
    /// On success the draft is reset to an empty composing draft. On
    /// validation failure no network call is made and the draft is back in
    /// `Composing`. On submit failure the draft keeps its content and the
    /// error message is retained in [`Draft::last_error`].
    pub async fn submit(&self, draft: &mut Draft) -> Result<SubmitOutcome> {
        if matches!(
            draft.status(),
            DraftStatus::Validating | DraftStatus::Submitting
        ) {
            return Err(FanoutError::InvalidInput(
                "a submit is already in progress".to_string(),
            ));
        }

        draft.clear_error();
        draft.set_status(DraftStatus::Validating);
        if let Err(errors) = self.validator.validate_for_submit(draft) {
            debug!("Submit blocked by {} validation error(s)", errors.len());
            draft.set_status(DraftStatus::Composing);
            return Err(errors.into());
        }

        let scheduled_at = if draft.schedule().is_later() {
            match draft.schedule().timestamp_in(&Local) {
                Some(ts) => Some(ts),
                None => {
                    draft.set_status(DraftStatus::Composing);
                    let time = draft.schedule().time.clone().unwrap_or_default();
                    return Err(ValidationErrors(vec![ValidationError::InvalidScheduleTime(
                        time,
                    )])
                    .into());
                }
            }
        } else {
            None
        };

        draft.set_status(DraftStatus::Submitting);
        self.event_bus.emit(Event::SubmitStarted {
            platforms: draft.platforms().iter().map(|p| p.to_string()).collect(),
            scheduled: scheduled_at.is_some(),
        });

        let status = scheduled_at.as_ref().map(|_| RecordStatus::Scheduled);
        let payload = build_payload(draft, self.constraints(), status, scheduled_at.clone());

        let created = match self.api.create_post(&payload).await {
            Ok(created) => created,
            Err(e) => {
                warn!("Create failed: {}", e);
                return Err(self.fail(draft, SubmitError::CreateFailed(e)));
            }
        };
        info!("Created post {}", created.id);
        self.event_bus.emit(Event::PostCreated {
            post_id: created.id.clone(),
        });

        match scheduled_at {
            Some(scheduled_at) => {
                draft.set_status(DraftStatus::Scheduled);
                self.event_bus.emit(Event::PostScheduled {
                    post_id: created.id.clone(),
                    scheduled_at: scheduled_at.clone(),
                });
                info!("Post {} scheduled for {}", created.id, scheduled_at);
                draft.reset();
                Ok(SubmitOutcome {
                    post_id: created.id,
                    status: DraftStatus::Scheduled,
                    scheduled_at: Some(scheduled_at),
                })
            }
            None => self.publish_created(draft, created.id).await,
        }
    }

    /// Publish a record left behind by [`SubmitError::CreatedNotPublished`]
    ///
    /// Only ever called on explicit user request.
    pub async fn retry_publish(&self, draft: &mut Draft, post_id: &str) -> Result<SubmitOutcome> {
        if post_id.trim().is_empty() {
            return Err(FanoutError::InvalidInput("post id is empty".to_string()));
        }
        if matches!(post_id, "." | "..")
            || post_id.contains(|c: char| matches!(c, '/' | '?' | '#') || c.is_whitespace())
        {
            return Err(FanoutError::InvalidInput(format!(
                "invalid post id '{}'",
                post_id
            )));
        }
        draft.clear_error();
        draft.set_status(DraftStatus::Submitting);
        self.publish_created(draft, post_id.to_string()).await
    }

    /// Store the draft remotely with status `draft`; the in-memory draft is kept
    pub async fn save_draft(&self, draft: &mut Draft) -> Result<String> {
        if draft.content().trim().is_empty() {
            return Err(ValidationErrors(vec![ValidationError::EmptyContent]).into());
        }

        let payload = build_payload(draft, self.constraints(), Some(RecordStatus::Draft), None);
        match self.api.create_post(&payload).await {
            Ok(created) => {
                info!("Saved draft as post {}", created.id);
                self.event_bus.emit(Event::DraftSaved {
                    post_id: created.id.clone(),
                });
                Ok(created.id)
            }
            Err(e) => {
                warn!("Saving draft failed: {}", e);
                Err(SubmitError::CreateFailed(e).into())
            }
        }
    }

    async fn publish_created(&self, draft: &mut Draft, post_id: String) -> Result<SubmitOutcome> {
        let reason = match self.api.publish_post(&post_id).await {
            Ok(result) if result.success => None,
            Ok(result) => Some(
                result
                    .message
                    .unwrap_or_else(|| "publish was rejected".to_string()),
            ),
            Err(e) => Some(e.to_string()),
        };

        if let Some(reason) = reason {
            warn!("Post {} was created but not published: {}", post_id, reason);
            return Err(self.fail(
                draft,
                SubmitError::CreatedNotPublished { post_id, reason },
            ));
        }

        draft.set_status(DraftStatus::Published);
        info!("Published post {}", post_id);
        self.event_bus.emit(Event::PostPublished {
            post_id: post_id.clone(),
        });
        draft.reset();
        Ok(SubmitOutcome {
            post_id,
            status: DraftStatus::Published,
            scheduled_at: None,
        })
    }

    fn fail(&self, draft: &mut Draft, error: SubmitError) -> FanoutError {
        let phase: SubmitPhase = error.phase();
        self.event_bus.emit(Event::SubmitFailed {
            phase: phase.to_string(),
            post_id: error.created_post_id().map(str::to_string),
            error: error.to_string(),
        });
        draft.fail(error.to_string());
        error.into()
    }
}
