//! Configuration management for Fanout

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Default maximum image size (50 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;
/// Default maximum video size (250 MiB)
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 250 * 1024 * 1024;
/// Character limit used when no platform is selected
pub const DEFAULT_CHARACTER_LIMIT: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Inline token; prefer `token_env` outside of tests
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub default_character_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_character_limit: DEFAULT_CHARACTER_LIMIT,
        }
    }
}

/// Adds a platform to the constraint table or overrides a built-in one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub max_length: usize,
    #[serde(default = "default_true")]
    pub requires_account: bool,
    #[serde(default)]
    pub plain_text_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            platforms: Vec::new(),
            category: default_category(),
        }
    }
}

fn default_token_env() -> String {
    "FANOUT_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "general".to_string()
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: the built-in defaults are used.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                token: None,
                token_env: default_token_env(),
                timeout_secs: default_timeout_secs(),
            },
            media: MediaConfig::default(),
            limits: LimitsConfig::default(),
            platforms: Vec::new(),
            defaults: DefaultsConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }
        if self.limits.default_character_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.default_character_limit".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        for platform in &self.platforms {
            if platform.id.trim().is_empty() {
                return Err(ConfigError::MissingField("platforms.id".to_string()).into());
            }
            if platform.max_length == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("platforms.{}.max_length", platform.id),
                    reason: "must be greater than zero".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Resolve the API token: inline value first, then the named env var
    pub fn api_token(&self) -> Result<String> {
        if let Some(token) = self.api.token.as_ref().filter(|t| !t.trim().is_empty()) {
            return Ok(token.clone());
        }
        std::env::var(&self.api.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingField(format!("api.token (or ${})", self.api.token_env)).into()
            })
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FANOUT_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("fanout").join("config.toml"))
}
