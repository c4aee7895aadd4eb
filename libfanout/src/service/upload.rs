//! Media upload service
//!
//! One call to [`UploadService::upload`] is one user gesture: the picked
//! files become local previews immediately, go out as a single batch, and
//! are then either replaced by their remote counterparts or rolled back
//! together. Uploads are never retried automatically.
//!
//! The three steps are also exposed separately ([`UploadService::begin`],
//! [`UploadService::send`], [`UploadService::finish`]) so a front end can
//! release its borrow of the draft while the network call is in flight. If
//! the draft is reset or discarded in the meantime, `finish` discards the
//! late result.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::events::{Event, EventBus};
use crate::api::ComposerApi;
use crate::draft::Draft;
use crate::error::{ApiError, UploadError};
use crate::media::{LocalFile, MediaRef, Rejection, RemoteMedia, Resolution, UploadTicket};

#[derive(Clone)]
pub struct UploadService {
    api: Arc<dyn ComposerApi>,
    event_bus: EventBus,
}

/// Outcome of one upload gesture
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Remote items that replaced their previews, in input order
    pub uploaded: Vec<MediaRef>,
    /// Files refused before anything was sent
    pub rejected: Vec<Rejection>,
    /// The draft was reset while the batch was in flight
    pub discarded: bool,
}

/// A batch whose previews are attached but whose upload has not resolved
#[derive(Debug)]
pub struct PendingUpload {
    ticket: Option<UploadTicket>,
    files: Vec<LocalFile>,
    rejected: Vec<Rejection>,
}

impl PendingUpload {
    pub fn ticket(&self) -> Option<UploadTicket> {
        self.ticket
    }

    pub fn files(&self) -> &[LocalFile] {
        &self.files
    }

    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }
}

impl UploadService {
    pub fn new(api: Arc<dyn ComposerApi>, event_bus: EventBus) -> Self {
        Self { api, event_bus }
    }

    /// Validate, attach previews and upload as one batch
    pub async fn upload(
        &self,
        draft: &mut Draft,
        files: Vec<LocalFile>,
    ) -> Result<UploadReport, UploadError> {
        let pending = self.begin(draft, files)?;
        let result = self.send(&pending).await;
        self.finish(draft, pending, result)
    }

    /// Attach previews for the acceptable files
    pub fn begin(
        &self,
        draft: &mut Draft,
        files: Vec<LocalFile>,
    ) -> Result<PendingUpload, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NothingToUpload);
        }

        let batch = draft.media_mut().add_local(files);
        for rejection in &batch.rejected {
            warn!("Skipping {}: {}", rejection.file_name, rejection.reason);
        }
        if let Some(ticket) = batch.ticket {
            self.event_bus.emit(Event::UploadStarted {
                batch: ticket.batch,
                files: ticket.expected,
            });
        }

        Ok(PendingUpload {
            ticket: batch.ticket,
            files: batch.files,
            rejected: batch.rejected,
        })
    }

    /// Issue the batch call; nothing is sent when every file was rejected
    pub async fn send(&self, pending: &PendingUpload) -> Result<Vec<RemoteMedia>, ApiError> {
        if pending.ticket.is_none() {
            return Ok(Vec::new());
        }
        debug!("Uploading {} file(s)", pending.files.len());
        self.api.upload_media(&pending.files).await
    }

    /// Apply the batch result to the draft
    pub fn finish(
        &self,
        draft: &mut Draft,
        pending: PendingUpload,
        result: Result<Vec<RemoteMedia>, ApiError>,
    ) -> Result<UploadReport, UploadError> {
        let Some(ticket) = pending.ticket else {
            return Ok(UploadReport {
                rejected: pending.rejected,
                ..Default::default()
            });
        };

        match draft.media_mut().resolve_upload(ticket, result) {
            Ok(Resolution::Applied(uploaded)) => {
                info!("Uploaded {} media item(s)", uploaded.len());
                self.event_bus.emit(Event::UploadCompleted {
                    batch: ticket.batch,
                    items: uploaded.len(),
                });
                Ok(UploadReport {
                    uploaded,
                    rejected: pending.rejected,
                    discarded: false,
                })
            }
            Ok(Resolution::Discarded) => Ok(UploadReport {
                uploaded: Vec::new(),
                rejected: pending.rejected,
                discarded: true,
            }),
            Err(e) => {
                warn!("Upload failed: {}", e);
                self.event_bus.emit(Event::UploadFailed {
                    batch: ticket.batch,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
