//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for each one
//! since it is usually a typo.
//!
//! Environment overrides (`NEWSDESK_API_URL`, `NEWSDESK_API_KEY`) take
//! precedence over the file and are applied by [`Config::apply_env`].
use crate::api::{ClientSettings, DEFAULT_MAX_RESPONSE_BYTES};
use crate::util::{validate_api_url, UrlValidationError};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const API_URL_ENV: &str = "NEWSDESK_API_URL";
pub const API_KEY_ENV: &str = "NEWSDESK_API_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid api_url: {0}")]
    InvalidApiUrl(#[from] UrlValidationError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// A selectable topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl Category {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    /// Label for display, falling back to the id.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Debug output masks `api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the feed endpoint; page parameters are appended to it.
    pub api_url: String,

    /// Bearer token for the feed API. `NEWSDESK_API_KEY` takes precedence.
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Upper bound on a single response body.
    pub max_response_bytes: usize,

    /// Category loaded on startup.
    pub default_category: String,

    /// Column width used when wrapping summaries.
    pub summary_width: usize,

    pub categories: Vec<Category>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5000/api/feed".to_string(),
            api_key: None,
            timeout_secs: 15,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            default_category: "all".to_string(),
            summary_width: 80,
            categories: vec![
                Category::new("all", "Top Stories"),
                Category::new("india", "India"),
                Category::new("world", "World"),
                Category::new("politics", "Politics"),
                Category::new("business", "Finance"),
                Category::new("technology", "Tech"),
                Category::new("health", "Health"),
                Category::new("sports", "Sports"),
                Category::new("entertainment", "Cinema"),
            ],
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("default_category", &self.default_category)
            .field("summary_width", &self.summary_width)
            .field("categories", &self.categories)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "api_url",
        "api_key",
        "timeout_secs",
        "max_response_bytes",
        "default_category",
        "summary_width",
        "categories",
    ];

    /// Default location: `$HOME/.config/newsdesk/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("newsdesk")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content).inspect(|config| {
            tracing::info!(path = %path.display(), api_url = %config.api_url, "Loaded configuration");
        })
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        Ok(toml::from_str(content)?)
    }

    /// Apply `NEWSDESK_API_URL` / `NEWSDESK_API_KEY` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, api_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(env = API_URL_ENV, "API URL overridden from environment");
            self.api_url = url;
        }
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            tracing::debug!(env = API_KEY_ENV, "API key taken from environment");
            self.api_key = Some(key);
        }
    }

    /// Whether `id` names one of the configured categories.
    pub fn has_category(&self, id: &str) -> bool {
        id.is_empty() || self.categories.iter().any(|c| c.id == id)
    }

    /// Validate and convert into HTTP client settings.
    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_response_bytes",
                reason: "must be greater than 0".to_string(),
            });
        }

        let mut settings = ClientSettings::new(validate_api_url(&self.api_url)?);
        settings.api_key = self.api_key.clone().map(SecretString::from);
        settings.timeout = Duration::from_secs(self.timeout_secs);
        settings.max_response_bytes = self.max_response_bytes;
        Ok(settings)
    }
}

// ============================================================================
// Tests
// ============================================================================
