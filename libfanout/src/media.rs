//! Media attached to a draft
//!
//! Items start as local previews (a `blob:` URL handed out by a
//! [`BlobStore`]) and become remote once the batch upload that carried them
//! resolves. Each upload gesture is one batch: a failed batch rolls back all
//! of its previews, and batches are independent of each other.
//!
//! Every `blob:` URL is released exactly once, when its item stops being
//! local: on removal, when the upload replaces it, on rollback, or when the
//! registry is cleared or dropped.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::error::{ApiError, BlobError, UploadError};
use crate::types::{Dimensions, FileType};

const BLOB_SCHEME: &str = "blob:";

/// A file picked by the user, not yet uploaded
#[derive(Clone)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub data: Vec<u8>,
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish()
    }
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(name, mime_type, data))
    }
}

/// Read several files concurrently, keeping the input order
pub async fn load_files<P: AsRef<Path>>(paths: &[P]) -> std::io::Result<Vec<LocalFile>> {
    futures::future::try_join_all(paths.iter().map(|p| LocalFile::from_path(p.as_ref()))).await
}

/// Why a picked file was not attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    UnsupportedType(String),
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::UnsupportedType(mime) => {
                write!(f, "unsupported file type '{}' (images and videos only)", mime)
            }
            RejectionReason::TooLarge { size, limit } => write!(
                f,
                "file is {} MB, the limit is {} MB",
                size.div_ceil(1024 * 1024),
                limit / (1024 * 1024)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub file_name: String,
    pub reason: RejectionReason,
}

/// Per-type size limits applied before anything is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLimits {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self::from(&MediaConfig::default())
    }
}

impl From<&MediaConfig> for MediaLimits {
    fn from(config: &MediaConfig) -> Self {
        Self {
            max_image_bytes: config.max_image_bytes,
            max_video_bytes: config.max_video_bytes,
        }
    }
}

impl MediaLimits {
    pub fn check(&self, file: &LocalFile) -> Result<FileType, RejectionReason> {
        let file_type = FileType::from_mime(&file.mime_type)
            .ok_or_else(|| RejectionReason::UnsupportedType(file.mime_type.clone()))?;
        let limit = match file_type {
            FileType::Image => self.max_image_bytes,
            FileType::Video => self.max_video_bytes,
        };
        if file.size > limit {
            return Err(RejectionReason::TooLarge {
                size: file.size,
                limit,
            });
        }
        Ok(file_type)
    }
}

/// Issues and releases local preview URLs
pub trait BlobStore: Send + Sync + fmt::Debug {
    fn create(&self, file: &LocalFile) -> String;

    fn release(&self, url: &str) -> Result<(), BlobError>;
}

/// In-process [`BlobStore`] that tracks which URLs are live
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    live: Mutex<HashSet<String>>,
    released: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Every URL released so far, in release order
    pub fn released(&self) -> Vec<String> {
        self.released.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn create(&self, file: &LocalFile) -> String {
        let url = format!("{}fanout/{}", BLOB_SCHEME, uuid::Uuid::new_v4());
        debug!("Created preview {} for {}", url, file.name);
        if let Ok(mut live) = self.live.lock() {
            live.insert(url.clone());
        }
        url
    }

    fn release(&self, url: &str) -> Result<(), BlobError> {
        let removed = self
            .live
            .lock()
            .map(|mut live| live.remove(url))
            .unwrap_or(false);
        if !removed {
            return Err(BlobError::NotLive(url.to_string()));
        }
        if let Ok(mut released) = self.released.lock() {
            released.push(url.to_string());
        }
        Ok(())
    }
}

/// One attached image or video
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub url: String,
    pub public_id: Option<String>,
    pub original_name: String,
    pub display_name: String,
    pub filename: String,
    pub file_type: FileType,
    pub size: u64,
    pub dimensions: Option<Dimensions>,
    /// Seconds; videos only
    pub duration: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub is_local: bool,
    origin: Option<BatchSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BatchSlot {
    batch: u64,
    slot: usize,
}

impl MediaRef {
    pub fn is_blob(&self) -> bool {
        self.url.starts_with(BLOB_SCHEME)
    }

    /// A remote item that did not come through this registry's uploads
    /// (e.g. picked from the media library)
    pub fn remote(url: impl Into<String>, name: impl Into<String>, file_type: FileType) -> Self {
        let name = name.into();
        Self {
            url: url.into(),
            public_id: None,
            original_name: name.clone(),
            display_name: name.clone(),
            filename: name,
            file_type,
            size: 0,
            dimensions: None,
            duration: None,
            thumbnail_url: None,
            is_local: false,
            origin: None,
        }
    }
}

/// One item of an upload response, in whatever shape the server sent
///
/// Normalized into a [`MediaRef`] exactly once, in
/// [`MediaRegistry::resolve_upload`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMedia {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "secure_url")]
    pub secure_url: Option<String>,
    #[serde(default, alias = "public_id")]
    pub public_id: Option<String>,
    #[serde(default, alias = "original_name", alias = "original_filename")]
    pub original_name: Option<String>,
    #[serde(default, alias = "display_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, alias = "file_type")]
    pub file_type: Option<String>,
    #[serde(default, alias = "resource_type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "bytes")]
    pub size: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, alias = "thumbnail_url")]
    pub thumbnail_url: Option<String>,
}

impl RemoteMedia {
    fn resolved_url(&self) -> Option<&str> {
        self.secure_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }

    fn resolved_type(&self, url: &str, fallback: FileType) -> FileType {
        let declared = [self.file_type.as_deref(), self.resource_type.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|t| match t.to_lowercase().as_str() {
                "image" => Some(FileType::Image),
                "video" => Some(FileType::Video),
                other => FileType::from_mime(other),
            });
        declared
            .or_else(|| {
                self.format
                    .as_deref()
                    .and_then(|ext| FileType::from_path(&format!("file.{}", ext)))
            })
            .or_else(|| FileType::from_path(url))
            .unwrap_or(fallback)
    }

    /// Canonical [`MediaRef`], filling gaps from the local preview it replaces
    pub fn into_media_ref(self, local: &MediaRef) -> Option<MediaRef> {
        let url = self.resolved_url()?.to_string();
        let file_type = self.resolved_type(&url, local.file_type);
        let dimensions = match (self.width, self.height) {
            (Some(width), Some(height)) => Some(Dimensions { width, height }),
            _ => local.dimensions,
        };
        let duration = match file_type {
            FileType::Video => self.duration.or(local.duration),
            FileType::Image => None,
        };
        Some(MediaRef {
            url,
            public_id: self.public_id,
            original_name: self
                .original_name
                .unwrap_or_else(|| local.original_name.clone()),
            display_name: self
                .display_name
                .unwrap_or_else(|| local.display_name.clone()),
            filename: self.filename.unwrap_or_else(|| local.filename.clone()),
            file_type,
            size: self.size.unwrap_or(local.size),
            dimensions,
            duration,
            thumbnail_url: self.thumbnail_url,
            is_local: false,
            origin: None,
        })
    }
}

/// Handle for one in-flight upload batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    pub batch: u64,
    pub expected: usize,
    generation: u64,
}

/// Result of attaching picked files as local previews
#[derive(Debug)]
pub struct LocalBatch {
    /// `None` when every file was rejected
    pub ticket: Option<UploadTicket>,
    /// Accepted files, in input order, ready to send
    pub files: Vec<LocalFile>,
    pub accepted: Vec<MediaRef>,
    pub rejected: Vec<Rejection>,
}

/// What happened to an upload response
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Previews were replaced by these remote items, in batch order
    Applied(Vec<MediaRef>),
    /// The registry was cleared while the upload was in flight
    Discarded,
}

/// Ordered media list of a draft
#[derive(Debug)]
pub struct MediaRegistry {
    items: Vec<MediaRef>,
    blobs: Arc<dyn BlobStore>,
    limits: MediaLimits,
    generation: u64,
    next_batch: u64,
}

impl MediaRegistry {
    pub fn new(blobs: Arc<dyn BlobStore>, limits: MediaLimits) -> Self {
        Self {
            items: Vec::new(),
            blobs,
            limits,
            generation: 0,
            next_batch: 1,
        }
    }

    pub fn items(&self) -> &[MediaRef] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&MediaRef> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_local(&self) -> bool {
        self.items.iter().any(|m| m.is_local)
    }

    pub fn limits(&self) -> MediaLimits {
        self.limits
    }

    /// Items that are safe to submit
    pub fn remote_items(&self) -> impl Iterator<Item = &MediaRef> {
        self.items.iter().filter(|m| !m.is_local)
    }

    /// Validate and append picked files as local previews
    ///
    /// Files that fail validation are returned in `rejected`; the accepted
    /// ones keep their input order and share one upload batch.
    pub fn add_local(&mut self, files: Vec<LocalFile>) -> LocalBatch {
        let batch = self.next_batch;
        let mut accepted = Vec::new();
        let mut accepted_files = Vec::new();
        let mut rejected = Vec::new();

        for file in files {
            match self.limits.check(&file) {
                Ok(file_type) => {
                    let url = self.blobs.create(&file);
                    let media = MediaRef {
                        url,
                        public_id: None,
                        original_name: file.name.clone(),
                        display_name: file.name.clone(),
                        filename: file.name.clone(),
                        file_type,
                        size: file.size,
                        dimensions: None,
                        duration: None,
                        thumbnail_url: None,
                        is_local: true,
                        origin: Some(BatchSlot {
                            batch,
                            slot: accepted.len(),
                        }),
                    };
                    self.items.push(media.clone());
                    accepted.push(media);
                    accepted_files.push(file);
                }
                Err(reason) => {
                    debug!("Rejected {}: {}", file.name, reason);
                    rejected.push(Rejection {
                        file_name: file.name,
                        reason,
                    });
                }
            }
        }

        let ticket = if accepted.is_empty() {
            None
        } else {
            self.next_batch += 1;
            Some(UploadTicket {
                batch,
                expected: accepted.len(),
                generation: self.generation,
            })
        };

        LocalBatch {
            ticket,
            files: accepted_files,
            accepted,
            rejected,
        }
    }

    /// Apply the outcome of a batch upload
    ///
    /// On success each preview of the batch is replaced in place by its
    /// remote counterpart (response order == input order). On failure, or if
    /// the response does not match the batch, every preview of the batch is
    /// removed and the error is returned. Previews the user removed while the
    /// upload was in flight are skipped.
    pub fn resolve_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<Vec<RemoteMedia>, ApiError>,
    ) -> Result<Resolution, UploadError> {
        if ticket.generation != self.generation {
            debug!(
                "Discarding upload batch {} for a draft that no longer exists",
                ticket.batch
            );
            return Ok(Resolution::Discarded);
        }

        let remote = match result {
            Ok(remote) => remote,
            Err(source) => {
                self.rollback_batch(ticket.batch);
                return Err(UploadError::Failed {
                    batch: ticket.batch,
                    source,
                });
            }
        };

        if remote.len() != ticket.expected {
            self.rollback_batch(ticket.batch);
            return Err(UploadError::IncompleteResponse {
                batch: ticket.batch,
                expected: ticket.expected,
                received: remote.len(),
            });
        }

        // Normalize everything before touching the list so a bad item
        // rolls back the whole batch.
        let mut replacements = Vec::new();
        for (slot, item) in remote.into_iter().enumerate() {
            let Some(index) = self.position_of(ticket.batch, slot) else {
                continue;
            };
            match item.into_media_ref(&self.items[index]) {
                Some(media) => replacements.push((index, media)),
                None => {
                    self.rollback_batch(ticket.batch);
                    return Err(UploadError::Failed {
                        batch: ticket.batch,
                        source: ApiError::Decode(format!("upload item {} has no url", slot)),
                    });
                }
            }
        }

        let mut applied = Vec::with_capacity(replacements.len());
        for (index, media) in replacements {
            let previous = std::mem::replace(&mut self.items[index], media.clone());
            self.release(&previous);
            applied.push(media);
        }
        Ok(Resolution::Applied(applied))
    }

    /// Remove the item at `index`; out-of-range indices are a no-op
    pub fn remove(&mut self, index: usize) -> Option<MediaRef> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.release(&removed);
        Some(removed)
    }

    /// Append an already-remote item (library import)
    pub fn push_remote(&mut self, media: MediaRef) {
        self.items.push(MediaRef {
            is_local: false,
            origin: None,
            ..media
        });
    }

    /// Drop everything and invalidate in-flight uploads
    pub fn clear(&mut self) {
        for media in std::mem::take(&mut self.items) {
            self.release(&media);
        }
        self.generation += 1;
    }

    fn position_of(&self, batch: u64, slot: usize) -> Option<usize> {
        self.items
            .iter()
            .position(|m| m.is_local && m.origin == Some(BatchSlot { batch, slot }))
    }

    fn rollback_batch(&mut self, batch: u64) {
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|m| m.is_local && m.origin.map(|o| o.batch) == Some(batch));
        self.items = kept;
        for media in &dropped {
            self.release(media);
        }
        debug!("Rolled back {} preview(s) of batch {}", dropped.len(), batch);
    }

    fn release(&self, media: &MediaRef) {
        if !media.is_blob() {
            return;
        }
        if let Err(e) = self.blobs.release(&media.url) {
            warn!("Failed to release preview {}: {}", media.url, e);
        }
    }
}

impl Drop for MediaRegistry {
    fn drop(&mut self) {
        for media in &self.items {
            self.release(media);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, size: usize) -> LocalFile {
        LocalFile::new(name, "image/png", vec![0; size])
    }

    fn video(name: &str, size: usize) -> LocalFile {
        LocalFile::new(name, "video/mp4", vec![0; size])
    }

    fn remote(url: &str) -> RemoteMedia {
        RemoteMedia {
            secure_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    fn registry(limits: MediaLimits) -> (MediaRegistry, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        (MediaRegistry::new(blobs.clone(), limits), blobs)
    }

    fn small_limits() -> MediaLimits {
        MediaLimits {
            max_image_bytes: 10,
            max_video_bytes: 20,
        }
    }

    #[test]
    fn test_add_local_reports_rejections_and_keeps_order() {
        let (mut media, blobs) = registry(small_limits());
        let batch = media.add_local(vec![
            image("a.png", 5),
            LocalFile::new("doc.pdf", "application/pdf", vec![1]),
            image("big.png", 11),
            video("clip.mp4", 15),
        ]);

        let names: Vec<_> = batch.accepted.iter().map(|m| m.original_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "clip.mp4"]);
        assert_eq!(batch.files.len(), 2);
        assert_eq!(batch.rejected.len(), 2);
        assert_eq!(
            batch.rejected[0].reason,
            RejectionReason::UnsupportedType("application/pdf".to_string())
        );
        assert_eq!(
            batch.rejected[1].reason,
            RejectionReason::TooLarge { size: 11, limit: 10 }
        );
        assert!(media.items().iter().all(|m| m.is_local && m.is_blob()));
        assert_eq!(blobs.live_count(), 2);
        assert_eq!(batch.ticket.unwrap().expected, 2);
    }

    #[test]
    fn test_all_rejected_yields_no_ticket() {
        let (mut media, _) = registry(small_limits());
        let batch = media.add_local(vec![LocalFile::new("a.txt", "text/plain", vec![])]);
        assert!(batch.ticket.is_none());
        assert!(media.is_empty());
    }

    #[test]
    fn test_resolve_upload_preserves_order_and_releases_previews() {
        let (mut media, blobs) = registry(MediaLimits::default());
        let batch = media.add_local(vec![image("1.png", 1), image("2.png", 1), image("3.png", 1)]);
        let previews: Vec<String> = batch.accepted.iter().map(|m| m.url.clone()).collect();

        let resolution = media
            .resolve_upload(
                batch.ticket.unwrap(),
                Ok(vec![
                    remote("https://cdn/1.png"),
                    remote("https://cdn/2.png"),
                    remote("https://cdn/3.png"),
                ]),
            )
            .unwrap();

        let urls: Vec<_> = media.items().iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["https://cdn/1.png", "https://cdn/2.png", "https://cdn/3.png"]);
        assert!(matches!(resolution, Resolution::Applied(ref items) if items.len() == 3));
        assert!(!media.has_local());
        assert_eq!(blobs.live_count(), 0);
        assert_eq!(blobs.released(), previews);
    }

    #[test]
    fn test_failed_batch_rolls_back_only_that_batch() {
        let (mut media, blobs) = registry(MediaLimits::default());
        let first = media.add_local(vec![image("a.png", 1)]);
        let second = media.add_local(vec![image("b.png", 1), image("c.png", 1)]);

        let err = media
            .resolve_upload(
                second.ticket.unwrap(),
                Err(ApiError::Network("connection reset".to_string())),
            )
            .unwrap_err();
        assert!(matches!(err, UploadError::Failed { .. }));
        assert_eq!(media.len(), 1);
        assert_eq!(media.items()[0].original_name, "a.png");
        assert_eq!(blobs.live_count(), 1);

        media
            .resolve_upload(first.ticket.unwrap(), Ok(vec![remote("https://cdn/a.png")]))
            .unwrap();
        assert_eq!(media.items()[0].url, "https://cdn/a.png");
    }

    #[test]
    fn test_incomplete_response_rolls_back_batch() {
        let (mut media, blobs) = registry(MediaLimits::default());
        let batch = media.add_local(vec![image("a.png", 1), image("b.png", 1)]);
        let err = media
            .resolve_upload(batch.ticket.unwrap(), Ok(vec![remote("https://cdn/a.png")]))
            .unwrap_err();
        assert_eq!(
            err,
            UploadError::IncompleteResponse {
                batch: batch.ticket.unwrap().batch,
                expected: 2,
                received: 1
            }
        );
        assert!(media.is_empty());
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn test_item_without_url_fails_whole_batch() {
        let (mut media, _) = registry(MediaLimits::default());
        let batch = media.add_local(vec![image("a.png", 1), image("b.png", 1)]);
        let result = media.resolve_upload(
            batch.ticket.unwrap(),
            Ok(vec![remote("https://cdn/a.png"), RemoteMedia::default()]),
        );
        assert!(result.is_err());
        assert!(media.is_empty());
    }

    #[test]
    fn test_preview_removed_mid_upload_is_skipped() {
        let (mut media, blobs) = registry(MediaLimits::default());
        let batch = media.add_local(vec![image("a.png", 1), image("b.png", 1)]);
        media.remove(0);

        let resolution = media
            .resolve_upload(
                batch.ticket.unwrap(),
                Ok(vec![remote("https://cdn/a.png"), remote("https://cdn/b.png")]),
            )
            .unwrap();

        assert_eq!(media.len(), 1);
        assert_eq!(media.items()[0].url, "https://cdn/b.png");
        assert!(matches!(resolution, Resolution::Applied(ref items) if items.len() == 1));
        assert_eq!(blobs.released().len(), 2);
    }

    #[test]
    fn test_remove_twice_never_double_releases() {
        let (mut media, blobs) = registry(MediaLimits::default());
        media.add_local(vec![image("a.png", 1)]);

        assert!(media.remove(0).is_some());
        assert!(media.remove(0).is_none());
        assert_eq!(blobs.released().len(), 1);
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn test_remove_remote_item_releases_nothing() {
        let (mut media, blobs) = registry(MediaLimits::default());
        media.push_remote(MediaRef::remote("https://cdn/lib.jpg", "lib.jpg", FileType::Image));
        media.remove(0);
        assert!(blobs.released().is_empty());
    }

    #[test]
    fn test_clear_discards_in_flight_upload() {
        let (mut media, blobs) = registry(MediaLimits::default());
        let batch = media.add_local(vec![image("a.png", 1)]);
        media.clear();
        assert_eq!(blobs.live_count(), 0);

        let resolution = media
            .resolve_upload(batch.ticket.unwrap(), Ok(vec![remote("https://cdn/a.png")]))
            .unwrap();
        assert_eq!(resolution, Resolution::Discarded);
        assert!(media.is_empty());
        assert_eq!(blobs.released().len(), 1);
    }

    #[test]
    fn test_drop_releases_remaining_previews_once() {
        let blobs = Arc::new(MemoryBlobStore::new());
        {
            let mut media = MediaRegistry::new(blobs.clone(), MediaLimits::default());
            media.add_local(vec![image("a.png", 1), image("b.png", 1)]);
            media.remove(0);
        }
        assert_eq!(blobs.released().len(), 2);
        assert_eq!(blobs.live_count(), 0);
    }

    #[test]
    fn test_remote_media_normalization() {
        let (mut media, _) = registry(MediaLimits::default());
        let batch = media.add_local(vec![video("clip.mp4", 1)]);
        let json = serde_json::json!({
            "url": "http://cdn/clip",
            "secure_url": "https://cdn/clip",
            "public_id": "abc",
            "resource_type": "video",
            "width": 1920,
            "height": 1080,
            "duration": 12.5,
            "bytes": 4096
        });
        let item: RemoteMedia = serde_json::from_value(json).unwrap();
        media.resolve_upload(batch.ticket.unwrap(), Ok(vec![item])).unwrap();

        let m = &media.items()[0];
        assert_eq!(m.url, "https://cdn/clip");
        assert_eq!(m.public_id.as_deref(), Some("abc"));
        assert_eq!(m.file_type, FileType::Video);
        assert_eq!(m.dimensions, Some(Dimensions { width: 1920, height: 1080 }));
        assert_eq!(m.duration, Some(12.5));
        assert_eq!(m.size, 4096);
        assert_eq!(m.original_name, "clip.mp4");
    }

    #[test]
    fn test_remote_media_type_guessed_from_extension() {
        let local = MediaRef::remote("blob:x", "x", FileType::Video);
        let item = RemoteMedia {
            url: Some("https://cdn/pic.webp".to_string()),
            ..Default::default()
        };
        assert_eq!(item.into_media_ref(&local).unwrap().file_type, FileType::Image);
    }

    #[test]
    fn test_rejection_reason_display() {
        let reason = RejectionReason::TooLarge {
            size: 60 * 1024 * 1024,
            limit: 50 * 1024 * 1024,
        };
        assert_eq!(reason.to_string(), "file is 60 MB, the limit is 50 MB");
    }

    #[tokio::test]
    async fn test_load_files_keeps_order_and_guesses_mime() {
        let dir = tempfile::TempDir::new().unwrap();
        let photo = dir.path().join("photo.jpg");
        let clip = dir.path().join("clip.mp4");
        std::fs::write(&photo, [1u8, 2, 3]).unwrap();
        std::fs::write(&clip, [4u8; 10]).unwrap();

        let files = load_files(&[clip.clone(), photo.clone()]).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "clip.mp4");
        assert_eq!(files[0].mime_type, "video/mp4");
        assert_eq!(files[0].size, 10);
        assert_eq!(files[1].name, "photo.jpg");
        assert_eq!(files[1].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_load_files_missing_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(load_files(&[missing]).await.is_err());
    }
}
