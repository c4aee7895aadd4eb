//! Draft validation
//!
//! Pure checks that gate the "show preview" and "submit" transitions. Both
//! entry points collect every violation instead of stopping at the first,
//! and both read the draft as it is right now.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use libfanout::draft::{Draft, DraftAction};
//! use libfanout::media::{MediaLimits, MemoryBlobStore};
//! use libfanout::platforms::ConstraintTable;
//! use libfanout::types::PlatformId;
//! use libfanout::validation::Validator;
//!
//! let table = Arc::new(ConstraintTable::builtin());
//! let validator = Validator::new(table);
//!
//! let mut draft = Draft::new(Arc::new(MemoryBlobStore::new()), MediaLimits::default());
//! draft.apply(DraftAction::SetContent("Hello".to_string()));
//! draft.apply(DraftAction::SelectPlatform(PlatformId::new("instagram")));
//!
//! let errors = validator.validate_for_preview(&draft).unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use std::sync::Arc;

use crate::draft::Draft;
use crate::error::{ValidationError, ValidationErrors};
use crate::platforms::ConstraintTable;
use crate::types::Schedule;

/// Validates drafts against a [`ConstraintTable`]
#[derive(Debug, Clone)]
pub struct Validator {
    constraints: Arc<ConstraintTable>,
}

impl Validator {
    pub fn new(constraints: Arc<ConstraintTable>) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &ConstraintTable {
        &self.constraints
    }

    /// Limit shown next to the editor for the current selection
    pub fn character_limit(&self, draft: &Draft) -> usize {
        self.constraints.character_limit(draft.platforms())
    }

    /// Characters left before the tightest limit; negative when over
    pub fn remaining_characters(&self, draft: &Draft) -> i64 {
        self.character_limit(draft) as i64 - content_length(draft.content()) as i64
    }

    /// Checks required before a preview can be shown
    pub fn validate_for_preview(&self, draft: &Draft) -> Result<(), ValidationErrors> {
        self.preview_errors(draft).into_result()
    }

    /// Preview checks plus length limits and schedule completeness
    pub fn validate_for_submit(&self, draft: &Draft) -> Result<(), ValidationErrors> {
        let mut errors = self.preview_errors(draft);
        let length = content_length(draft.content());

        if draft.platforms().is_empty() {
            let limit = self.constraints.default_limit();
            if length > limit {
                errors
                    .0
                    .push(ValidationError::ContentExceedsDefaultLimit { length, limit });
            }
        } else {
            for platform in draft.platforms() {
                let limit = self.constraints.limit_for(platform);
                if length > limit {
                    errors.0.push(ValidationError::ContentTooLong {
                        platform: platform.clone(),
                        length,
                        limit,
                    });
                }
            }
        }

        errors.0.extend(schedule_errors(draft.schedule()));
        errors.into_result()
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self, draft: &Draft) -> bool {
        self.validate_for_submit(draft).is_ok()
    }

    fn preview_errors(&self, draft: &Draft) -> ValidationErrors {
        let mut errors = Vec::new();

        if draft.content().trim().is_empty() {
            errors.push(ValidationError::EmptyContent);
        }

        if draft.platforms().is_empty() {
            errors.push(ValidationError::NoPlatformSelected);
        }

        if self.constraints.media_required(draft.platforms()) && draft.media().is_empty() {
            errors.push(ValidationError::MediaRequired);
        }

        for platform in draft.platforms() {
            if self.constraints.accounts_required(platform)
                && draft.valid_accounts(platform).next().is_none()
            {
                errors.push(ValidationError::AccountRequired {
                    platform: platform.clone(),
                });
            }
        }

        ValidationErrors(errors)
    }
}

/// Length as the user perceives it (Unicode scalar values, not bytes)
pub fn content_length(content: &str) -> usize {
    content.chars().count()
}

fn schedule_errors(schedule: &Schedule) -> Vec<ValidationError> {
    if !schedule.is_later() {
        return Vec::new();
    }
    let mut errors = Vec::new();
    if schedule.date.is_none() {
        errors.push(ValidationError::ScheduleDateMissing);
    }
    match schedule.time.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::ScheduleTimeMissing),
        Some(time) if Schedule::parse_time(time).is_none() => {
            errors.push(ValidationError::InvalidScheduleTime(time.to_string()));
        }
        Some(_) => {}
    }
    errors
}
