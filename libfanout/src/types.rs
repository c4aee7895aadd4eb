//! Core value types shared by the draft, validator and publish pipeline

use std::fmt;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a target social network (e.g. "twitter", "instagram")
///
/// Always stored lowercase so lookups in the constraint table are stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlatformId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PlatformId> for String {
    fn from(id: PlatformId) -> Self {
        id.0
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A connected identity on a platform
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank ids never count as a selection
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Lifecycle tag of an in-memory draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    Composing,
    Validating,
    Submitting,
    Published,
    Scheduled,
    Failed,
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DraftStatus::Composing => "composing",
            DraftStatus::Validating => "validating",
            DraftStatus::Submitting => "submitting",
            DraftStatus::Published => "published",
            DraftStatus::Scheduled => "scheduled",
            DraftStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    #[default]
    Now,
    Later,
}

/// When the post should go out
///
/// `time` is kept as the user typed it (`HH:MM`); it is only parsed when the
/// schedule is turned into a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schedule {
    pub mode: ScheduleMode,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl Schedule {
    pub fn now() -> Self {
        Self::default()
    }

    pub fn later(date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            mode: ScheduleMode::Later,
            date: Some(date),
            time: Some(time.into()),
        }
    }

    pub fn is_later(&self) -> bool {
        self.mode == ScheduleMode::Later
    }

    /// Parse the stored time of day, accepting `HH:MM` and `HH:MM:SS`
    pub fn parse_time(time: &str) -> Option<NaiveTime> {
        let time = time.trim();
        NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .ok()
    }

    /// Combine date and time, interpreted in `tz`, into a UTC instant
    ///
    /// Returns `None` when either part is missing, the time does not parse,
    /// or the wall-clock time does not exist in `tz`.
    pub fn instant_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        let date = self.date?;
        let time = Self::parse_time(self.time.as_deref()?)?;
        let naive = NaiveDateTime::new(date, time);
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }

    /// ISO 8601 timestamp sent as `scheduledDate`
    pub fn timestamp_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<String> {
        self.instant_in(tz)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub category: String,
}

impl Default for PostMetadata {
    fn default() -> Self {
        Self {
            category: "general".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
}

impl FileType {
    /// Classify a MIME string; only `image/*` and `video/*` are media
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_lowercase();
        if mime.starts_with("image/") {
            Some(FileType::Image)
        } else if mime.starts_with("video/") {
            Some(FileType::Video)
        } else {
            None
        }
    }

    /// Best guess from a file name or URL
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        mime_guess::from_path(path)
            .first()
            .and_then(|mime| Self::from_mime(mime.essence_str()))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Image => f.write_str("image"),
            FileType::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}
