//! Platform constraint table
//!
//! Static per-platform rules used by the validator and the payload builder:
//! character limits, whether target accounts must be chosen, and whether the
//! platform only renders plain text (so emphasis has to be turned into
//! Unicode bold glyphs before submit).
//!
//! # Examples
//!
//! ```
//! use libfanout::platforms::ConstraintTable;
//! use libfanout::types::PlatformId;
//!
//! let table = ConstraintTable::builtin();
//! let both = [PlatformId::new("twitter"), PlatformId::new("instagram")];
//!
//! assert_eq!(table.character_limit(&both), 280);
//! assert_eq!(table.character_limit(&both[1..]), 2200);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{Config, DEFAULT_CHARACTER_LIMIT};
use crate::types::{AccountId, PlatformId};

/// Rules for a single platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConstraint {
    pub id: PlatformId,
    pub display_name: String,
    pub max_length: usize,
    pub requires_account_selection: bool,
    pub plain_text_only: bool,
}

/// Lookup table of [`PlatformConstraint`]s keyed by platform id
#[derive(Debug, Clone)]
pub struct ConstraintTable {
    platforms: BTreeMap<PlatformId, PlatformConstraint>,
    default_limit: usize,
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ConstraintTable {
    /// The two reference platforms
    pub fn builtin() -> Self {
        let mut table = Self {
            platforms: BTreeMap::new(),
            default_limit: DEFAULT_CHARACTER_LIMIT,
        };
        table.insert(PlatformConstraint {
            id: PlatformId::new("twitter"),
            display_name: "Twitter".to_string(),
            max_length: 280,
            requires_account_selection: true,
            plain_text_only: true,
        });
        table.insert(PlatformConstraint {
            id: PlatformId::new("instagram"),
            display_name: "Instagram".to_string(),
            max_length: 2200,
            requires_account_selection: true,
            plain_text_only: true,
        });
        table
    }

    /// Built-in platforms plus any `[[platforms]]` entries from config
    pub fn from_config(config: &Config) -> Self {
        let mut table = Self::builtin();
        table.default_limit = config.limits.default_character_limit;
        for entry in &config.platforms {
            let id = PlatformId::new(&entry.id);
            let display_name = entry
                .display_name
                .clone()
                .unwrap_or_else(|| id.as_str().to_string());
            table.insert(PlatformConstraint {
                id,
                display_name,
                max_length: entry.max_length,
                requires_account_selection: entry.requires_account,
                plain_text_only: entry.plain_text_only,
            });
        }
        table
    }

    /// Add or replace a platform's rules
    pub fn insert(&mut self, constraint: PlatformConstraint) {
        self.platforms.insert(constraint.id.clone(), constraint);
    }

    pub fn get(&self, platform: &PlatformId) -> Option<&PlatformConstraint> {
        self.platforms.get(platform)
    }

    pub fn is_known(&self, platform: &PlatformId) -> bool {
        self.platforms.contains_key(platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &PlatformConstraint> {
        self.platforms.values()
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Limit for one platform; unknown platforms get the default limit
    pub fn limit_for(&self, platform: &PlatformId) -> usize {
        self.get(platform)
            .map(|c| c.max_length)
            .unwrap_or(self.default_limit)
    }

    /// The tightest limit across the selection, or the default when empty
    pub fn character_limit<'a, I>(&self, selected: I) -> usize
    where
        I: IntoIterator<Item = &'a PlatformId>,
    {
        selected
            .into_iter()
            .map(|p| self.limit_for(p))
            .min()
            .unwrap_or(self.default_limit)
    }

    /// Media is mandatory for every post as soon as a platform is selected
    pub fn media_required<'a, I>(&self, selected: I) -> bool
    where
        I: IntoIterator<Item = &'a PlatformId>,
    {
        selected.into_iter().next().is_some()
    }

    pub fn accounts_required(&self, platform: &PlatformId) -> bool {
        self.get(platform)
            .map(|c| c.requires_account_selection)
            .unwrap_or(false)
    }

    /// True when any selected platform cannot render markup
    pub fn requires_plain_text<'a, I>(&self, selected: I) -> bool
    where
        I: IntoIterator<Item = &'a PlatformId>,
    {
        selected
            .into_iter()
            .any(|p| self.get(p).map(|c| c.plain_text_only).unwrap_or(false))
    }
}

/// A platform the user has connected, as reported by the accounts endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPlatform {
    pub platform: PlatformId,
    #[serde(default)]
    pub accounts: Vec<ConnectedAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: AccountId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Accounts connected for `platform`, if any
pub fn accounts_for<'a>(
    connections: &'a [ConnectedPlatform],
    platform: &PlatformId,
) -> &'a [ConnectedAccount] {
    connections
        .iter()
        .find(|c| &c.platform == platform)
        .map(|c| c.accounts.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    fn ids(names: &[&str]) -> Vec<PlatformId> {
        names.iter().map(|n| PlatformId::new(n)).collect()
    }

    #[test]
    fn test_character_limit_narrows_to_minimum() {
        let table = ConstraintTable::builtin();
        assert_eq!(table.character_limit(&ids(&["twitter", "instagram"])), 280);
        assert_eq!(table.character_limit(&ids(&["instagram"])), 2200);
    }

    #[test]
    fn test_character_limit_falls_back_to_default() {
        let table = ConstraintTable::builtin();
        assert_eq!(table.character_limit(&ids(&[])), DEFAULT_CHARACTER_LIMIT);
    }

    #[test]
    fn test_unknown_platform_uses_default_limit() {
        let table = ConstraintTable::builtin();
        assert_eq!(table.limit_for(&PlatformId::new("mystery")), DEFAULT_CHARACTER_LIMIT);
        assert!(!table.accounts_required(&PlatformId::new("mystery")));
    }

    #[test]
    fn test_media_required_iff_any_platform() {
        let table = ConstraintTable::builtin();
        assert!(!table.media_required(&ids(&[])));
        assert!(table.media_required(&ids(&["instagram"])));
    }

    #[test]
    fn test_reference_platforms_require_accounts() {
        let table = ConstraintTable::builtin();
        assert!(table.accounts_required(&PlatformId::new("twitter")));
        assert!(table.accounts_required(&PlatformId::new("instagram")));
    }

    #[test]
    fn test_from_config_adds_and_overrides() {
        let mut config = Config::default_config();
        config.limits.default_character_limit = 1000;
        config.platforms = vec![
            PlatformConfig {
                id: "LinkedIn".to_string(),
                display_name: None,
                max_length: 3000,
                requires_account: false,
                plain_text_only: false,
            },
            PlatformConfig {
                id: "twitter".to_string(),
                display_name: Some("X".to_string()),
                max_length: 25000,
                requires_account: true,
                plain_text_only: true,
            },
        ];

        let table = ConstraintTable::from_config(&config);
        let linkedin = table.get(&PlatformId::new("linkedin")).unwrap();
        assert_eq!(linkedin.max_length, 3000);
        assert_eq!(linkedin.display_name, "linkedin");
        assert!(!table.accounts_required(&linkedin.id));
        assert_eq!(table.limit_for(&PlatformId::new("twitter")), 25000);
        assert_eq!(table.default_limit(), 1000);
        assert!(!table.requires_plain_text(&ids(&["linkedin"])));
        assert!(table.requires_plain_text(&ids(&["linkedin", "instagram"])));
    }

    #[test]
    fn test_accounts_for_connection() {
        let connections = vec![ConnectedPlatform {
            platform: PlatformId::new("instagram"),
            accounts: vec![ConnectedAccount {
                id: AccountId::new("ig-1"),
                name: "Brand".to_string(),
                username: Some("@brand".to_string()),
            }],
        }];
        assert_eq!(accounts_for(&connections, &PlatformId::new("instagram")).len(), 1);
        assert!(accounts_for(&connections, &PlatformId::new("twitter")).is_empty());
    }
}
