//! The in-memory draft and its state transitions
//!
//! All edits go through [`Draft::apply`] with a typed [`DraftAction`]. Each
//! transition keeps the draft consistent on its own: deselecting a platform
//! drops its account selection in the same step, so no caller can leave
//! `selected_accounts` pointing at a platform that is not selected.
//!
//! Media is edited through [`Draft::media_mut`]; see [`crate::media`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::media::{BlobStore, MediaLimits, MediaRegistry};
use crate::text;
use crate::types::{AccountId, DraftStatus, PlatformId, PostMetadata, Schedule};

/// A single edit to a [`Draft`]
#[derive(Debug, Clone, PartialEq)]
pub enum DraftAction {
    SetContent(String),

    SelectPlatform(PlatformId),
    DeselectPlatform(PlatformId),
    TogglePlatform(PlatformId),
    /// Replace the whole platform selection
    SetPlatforms(Vec<PlatformId>),

    /// Ignored unless `platform` is selected
    SelectAccount {
        platform: PlatformId,
        account: AccountId,
    },
    DeselectAccount {
        platform: PlatformId,
        account: AccountId,
    },
    /// Replace the account selection of one platform
    SetAccounts {
        platform: PlatformId,
        accounts: Vec<AccountId>,
    },

    /// Free text; whitespace-split, tokens without `#` dropped
    SetHashtagsText(String),
    AddHashtag(String),
    RemoveHashtag(usize),
    /// Merge suggestions after the existing tags (no dedupe)
    AppendHashtags(Vec<String>),

    /// Free text; whitespace-split, tokens without `@` dropped
    SetMentionsText(String),
    AddMention(String),
    RemoveMention(usize),
    AppendMentions(Vec<String>),

    SetSchedule(Schedule),
    SetCategory(String),

    /// Replace content, hashtags and platform scope with a generated suggestion
    ApplySuggestion {
        content: String,
        hashtags: Vec<String>,
        platforms: Vec<PlatformId>,
    },
}

/// Mutable composition state owned by one compose session
#[derive(Debug)]
pub struct Draft {
    content: String,
    platforms: BTreeSet<PlatformId>,
    selected_accounts: BTreeMap<PlatformId, BTreeSet<AccountId>>,
    media: MediaRegistry,
    hashtags: Vec<String>,
    mentions: Vec<String>,
    schedule: Schedule,
    metadata: PostMetadata,
    status: DraftStatus,
    last_error: Option<String>,
}

impl Draft {
    pub fn new(blobs: Arc<dyn BlobStore>, limits: MediaLimits) -> Self {
        Self {
            content: String::new(),
            platforms: BTreeSet::new(),
            selected_accounts: BTreeMap::new(),
            media: MediaRegistry::new(blobs, limits),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            schedule: Schedule::default(),
            metadata: PostMetadata::default(),
            status: DraftStatus::Composing,
            last_error: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn platforms(&self) -> &BTreeSet<PlatformId> {
        &self.platforms
    }

    pub fn selected_accounts(&self) -> &BTreeMap<PlatformId, BTreeSet<AccountId>> {
        &self.selected_accounts
    }

    /// Non-blank accounts chosen for `platform`
    pub fn valid_accounts(&self, platform: &PlatformId) -> impl Iterator<Item = &AccountId> {
        self.selected_accounts
            .get(platform)
            .into_iter()
            .flatten()
            .filter(|a| a.is_valid())
    }

    pub fn media(&self) -> &MediaRegistry {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut MediaRegistry {
        &mut self.media
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    pub fn mentions(&self) -> &[String] {
        &self.mentions
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn metadata(&self) -> &PostMetadata {
        &self.metadata
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    /// Message of the last failed submit, kept for display
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Every key of `selected_accounts` is a selected platform
    pub fn accounts_consistent(&self) -> bool {
        self.selected_accounts
            .keys()
            .all(|p| self.platforms.contains(p))
    }

    /// Apply one edit
    pub fn apply(&mut self, action: DraftAction) {
        match action {
            DraftAction::SetContent(content) => self.content = content,

            DraftAction::SelectPlatform(platform) => {
                self.platforms.insert(platform);
            }
            DraftAction::DeselectPlatform(platform) => self.deselect_platform(&platform),
            DraftAction::TogglePlatform(platform) => {
                if self.platforms.contains(&platform) {
                    self.deselect_platform(&platform);
                } else {
                    self.platforms.insert(platform);
                }
            }
            DraftAction::SetPlatforms(platforms) => self.set_platforms(platforms),

            DraftAction::SelectAccount { platform, account } => {
                if !self.platforms.contains(&platform) {
                    debug!(
                        "Ignoring account {} for unselected platform {}",
                        account, platform
                    );
                    return;
                }
                self.selected_accounts
                    .entry(platform)
                    .or_default()
                    .insert(account);
            }
            DraftAction::DeselectAccount { platform, account } => {
                if let Some(accounts) = self.selected_accounts.get_mut(&platform) {
                    accounts.remove(&account);
                    if accounts.is_empty() {
                        self.selected_accounts.remove(&platform);
                    }
                }
            }
            DraftAction::SetAccounts { platform, accounts } => {
                if !self.platforms.contains(&platform) {
                    debug!("Ignoring accounts for unselected platform {}", platform);
                    return;
                }
                let accounts: BTreeSet<AccountId> = accounts.into_iter().collect();
                if accounts.is_empty() {
                    self.selected_accounts.remove(&platform);
                } else {
                    self.selected_accounts.insert(platform, accounts);
                }
            }

            DraftAction::SetHashtagsText(text) => {
                self.hashtags = text::normalize_tags(&text, '#');
            }
            DraftAction::AddHashtag(tag) => {
                if let Some(tag) = text::with_prefix(&tag, '#') {
                    self.hashtags.push(tag);
                }
            }
            DraftAction::RemoveHashtag(index) => {
                if index < self.hashtags.len() {
                    self.hashtags.remove(index);
                }
            }
            DraftAction::AppendHashtags(tags) => {
                self.hashtags
                    .extend(tags.iter().filter_map(|t| text::with_prefix(t, '#')));
            }

            DraftAction::SetMentionsText(text) => {
                self.mentions = text::normalize_tags(&text, '@');
            }
            DraftAction::AddMention(mention) => {
                if let Some(mention) = text::with_prefix(&mention, '@') {
                    self.mentions.push(mention);
                }
            }
            DraftAction::RemoveMention(index) => {
                if index < self.mentions.len() {
                    self.mentions.remove(index);
                }
            }
            DraftAction::AppendMentions(mentions) => {
                self.mentions
                    .extend(mentions.iter().filter_map(|m| text::with_prefix(m, '@')));
            }

            DraftAction::SetSchedule(schedule) => self.schedule = schedule,
            DraftAction::SetCategory(category) => self.metadata.category = category,

            DraftAction::ApplySuggestion {
                content,
                hashtags,
                platforms,
            } => {
                self.content = content;
                self.hashtags = hashtags
                    .iter()
                    .filter_map(|t| text::with_prefix(t, '#'))
                    .collect();
                self.set_platforms(platforms);
            }
        }
    }

    /// Back to an empty composing draft; local previews are released
    pub fn reset(&mut self) {
        self.content.clear();
        self.platforms.clear();
        self.selected_accounts.clear();
        self.media.clear();
        self.hashtags.clear();
        self.mentions.clear();
        self.schedule = Schedule::default();
        self.metadata = PostMetadata::default();
        self.status = DraftStatus::Composing;
        self.last_error = None;
    }

    pub(crate) fn set_status(&mut self, status: DraftStatus) {
        debug!("Draft status {} -> {}", self.status, status);
        self.status = status;
    }

    /// Record a failure and return to composing
    pub(crate) fn fail(&mut self, message: String) {
        self.set_status(DraftStatus::Failed);
        self.last_error = Some(message);
        self.set_status(DraftStatus::Composing);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn deselect_platform(&mut self, platform: &PlatformId) {
        self.platforms.remove(platform);
        self.selected_accounts.remove(platform);
    }

    fn set_platforms(&mut self, platforms: Vec<PlatformId>) {
        self.platforms = platforms.into_iter().collect();
        let selected = &self.platforms;
        self.selected_accounts.retain(|p, _| selected.contains(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MemoryBlobStore;
    use chrono::NaiveDate;

    fn draft() -> Draft {
        Draft::new(Arc::new(MemoryBlobStore::new()), MediaLimits::default())
    }

    fn p(id: &str) -> PlatformId {
        PlatformId::new(id)
    }

    fn a(id: &str) -> AccountId {
        AccountId::new(id)
    }

    #[test]
    fn test_new_draft_is_composing_and_empty() {
        let d = draft();
        assert_eq!(d.status(), DraftStatus::Composing);
        assert!(d.content().is_empty());
        assert!(d.platforms().is_empty());
        assert!(d.media().is_empty());
        assert_eq!(d.metadata().category, "general");
    }

    #[test]
    fn test_deselect_platform_drops_its_accounts() {
        let mut d = draft();
        d.apply(DraftAction::SelectPlatform(p("twitter")));
        d.apply(DraftAction::SelectPlatform(p("instagram")));
        d.apply(DraftAction::SelectAccount {
            platform: p("twitter"),
            account: a("tw-1"),
        });
        d.apply(DraftAction::SelectAccount {
            platform: p("instagram"),
            account: a("ig-1"),
        });

        d.apply(DraftAction::DeselectPlatform(p("twitter")));

        assert!(!d.selected_accounts().contains_key(&p("twitter")));
        assert!(d.selected_accounts().contains_key(&p("instagram")));
        assert!(d.accounts_consistent());
    }

    #[test]
    fn test_toggle_off_drops_accounts() {
        let mut d = draft();
        d.apply(DraftAction::TogglePlatform(p("twitter")));
        d.apply(DraftAction::SelectAccount {
            platform: p("twitter"),
            account: a("tw-1"),
        });
        d.apply(DraftAction::TogglePlatform(p("twitter")));
        assert!(d.platforms().is_empty());
        assert!(d.selected_accounts().is_empty());
    }

    #[test]
    fn test_set_platforms_prunes_orphans() {
        let mut d = draft();
        d.apply(DraftAction::SetPlatforms(vec![p("twitter"), p("instagram")]));
        d.apply(DraftAction::SetAccounts {
            platform: p("twitter"),
            accounts: vec![a("tw-1"), a("tw-2")],
        });
        d.apply(DraftAction::SetPlatforms(vec![p("instagram")]));
        assert!(d.selected_accounts().is_empty());
        assert!(d.accounts_consistent());
    }

    #[test]
    fn test_account_for_unselected_platform_is_ignored() {
        let mut d = draft();
        d.apply(DraftAction::SelectAccount {
            platform: p("twitter"),
            account: a("tw-1"),
        });
        assert!(d.selected_accounts().is_empty());
    }

    #[test]
    fn test_deselecting_last_account_removes_entry() {
        let mut d = draft();
        d.apply(DraftAction::SelectPlatform(p("twitter")));
        d.apply(DraftAction::SelectAccount {
            platform: p("twitter"),
            account: a("tw-1"),
        });
        d.apply(DraftAction::DeselectAccount {
            platform: p("twitter"),
            account: a("tw-1"),
        });
        assert!(d.selected_accounts().is_empty());
    }

    #[test]
    fn test_valid_accounts_skip_blank_ids() {
        let mut d = draft();
        d.apply(DraftAction::SelectPlatform(p("twitter")));
        d.apply(DraftAction::SetAccounts {
            platform: p("twitter"),
            accounts: vec![a(""), a("  "), a("tw-1")],
        });
        let valid: Vec<_> = d.valid_accounts(&p("twitter")).collect();
        assert_eq!(valid, vec![&a("tw-1")]);
    }

    #[test]
    fn test_hashtag_text_is_normalized_without_dedupe() {
        let mut d = draft();
        d.apply(DraftAction::SetHashtagsText("#rust plain #rust #async".to_string()));
        assert_eq!(d.hashtags(), ["#rust", "#rust", "#async"]);

        d.apply(DraftAction::AddHashtag("tokio".to_string()));
        d.apply(DraftAction::AppendHashtags(vec!["#rust".to_string()]));
        assert_eq!(d.hashtags(), ["#rust", "#rust", "#async", "#tokio", "#rust"]);

        d.apply(DraftAction::RemoveHashtag(0));
        d.apply(DraftAction::RemoveHashtag(99));
        assert_eq!(d.hashtags().len(), 4);
    }

    #[test]
    fn test_mentions_normalized() {
        let mut d = draft();
        d.apply(DraftAction::SetMentionsText("@alice bob @carol".to_string()));
        d.apply(DraftAction::AppendMentions(vec!["dave".to_string()]));
        assert_eq!(d.mentions(), ["@alice", "@carol", "@dave"]);
    }

    #[test]
    fn test_apply_suggestion_replaces_wholesale() {
        let mut d = draft();
        d.apply(DraftAction::SetContent("old".to_string()));
        d.apply(DraftAction::SetHashtagsText("#old".to_string()));
        d.apply(DraftAction::SetPlatforms(vec![p("twitter"), p("instagram")]));
        d.apply(DraftAction::SelectAccount {
            platform: p("twitter"),
            account: a("tw-1"),
        });
        d.apply(DraftAction::SelectAccount {
            platform: p("instagram"),
            account: a("ig-1"),
        });

        d.apply(DraftAction::ApplySuggestion {
            content: "Great launch!".to_string(),
            hashtags: vec!["#new".to_string(), "#launch".to_string()],
            platforms: vec![p("instagram")],
        });

        assert_eq!(d.content(), "Great launch!");
        assert_eq!(d.hashtags(), ["#new", "#launch"]);
        assert_eq!(d.platforms().len(), 1);
        assert!(d.platforms().contains(&p("instagram")));
        assert!(d.accounts_consistent());
        assert_eq!(d.valid_accounts(&p("instagram")).count(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut d = draft();
        d.apply(DraftAction::SetContent("hello".to_string()));
        d.apply(DraftAction::SelectPlatform(p("twitter")));
        d.apply(DraftAction::AddMention("someone".to_string()));
        d.apply(DraftAction::SetCategory("news".to_string()));
        d.apply(DraftAction::SetSchedule(Schedule::later(
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            "10:00",
        )));
        d.fail("boom".to_string());

        d.reset();

        assert!(d.content().is_empty());
        assert!(d.platforms().is_empty());
        assert!(d.mentions().is_empty());
        assert!(!d.schedule().is_later());
        assert_eq!(d.metadata().category, "general");
        assert_eq!(d.status(), DraftStatus::Composing);
        assert!(d.last_error().is_none());
    }

    #[test]
    fn test_fail_returns_to_composing_with_error() {
        let mut d = draft();
        d.set_status(DraftStatus::Submitting);
        d.fail("create failed".to_string());
        assert_eq!(d.status(), DraftStatus::Composing);
        assert_eq!(d.last_error(), Some("create failed"));
    }

    #[test]
    fn test_invariant_holds_over_action_sequence() {
        let actions = vec![
            DraftAction::SelectPlatform(p("twitter")),
            DraftAction::SelectAccount {
                platform: p("twitter"),
                account: a("tw-1"),
            },
            DraftAction::TogglePlatform(p("instagram")),
            DraftAction::SetAccounts {
                platform: p("instagram"),
                accounts: vec![a("ig-1")],
            },
            DraftAction::DeselectPlatform(p("twitter")),
            DraftAction::SelectAccount {
                platform: p("twitter"),
                account: a("tw-2"),
            },
            DraftAction::ApplySuggestion {
                content: "x".to_string(),
                hashtags: vec![],
                platforms: vec![p("twitter")],
            },
            DraftAction::SetPlatforms(vec![]),
        ];

        let mut d = draft();
        for action in actions {
            d.apply(action);
            assert!(d.accounts_consistent());
        }
        assert!(d.selected_accounts().is_empty());
    }
}
