//! # Client Configuration
//!
//! Configuration management for the PharmaDesk client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PHARMADESK_API_URL=http://localhost:5000/api                       │
//! │     PHARMADESK_SESSION_PATH=/tmp/session.json                          │
//! │     PHARMADESK_NOTIFY_TTL_MS=4000                                      │
//! │     PHARMADESK_SEARCH_DEBOUNCE_MS=500                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pharmadesk/client.toml (Linux)                           │
//! │     ~/Library/Application Support/in.pharmadesk.PharmaDesk/ (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "https://pharma-back-1.onrender.com/api"
//!
//! [ui]
//! notify_ttl_ms = 4000
//! search_debounce_ms = 500
//! low_stock_threshold = 10
//! expiry_window_days = 90
//!
//! [session]
//! path = "/var/lib/pharmadesk/session.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use pharmadesk_core::{DEFAULT_EXPIRY_WINDOW_DAYS, LOW_STOCK_THRESHOLD};

use crate::error::{ClientError, ClientResult};

const ENV_API_URL: &str = "PHARMADESK_API_URL";
const ENV_SESSION_PATH: &str = "PHARMADESK_SESSION_PATH";
const ENV_NOTIFY_TTL: &str = "PHARMADESK_NOTIFY_TTL_MS";
const ENV_SEARCH_DEBOUNCE: &str = "PHARMADESK_SEARCH_DEBOUNCE_MS";

// =============================================================================
// API Settings
// =============================================================================

/// Where the backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every request path is appended to (no trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://pharma-back-1.onrender.com/api".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
        }
    }
}

// =============================================================================
// UI Settings
// =============================================================================

/// Timing and thresholds of the front-end behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// How long a toast stays up (milliseconds).
    #[serde(default = "default_notify_ttl")]
    pub notify_ttl_ms: u64,

    /// Quiet period before a search keystroke hits the backend (milliseconds).
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,

    /// Stock at or below this is flagged.
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: i64,

    /// Look-ahead of the expiry report.
    #[serde(default = "default_expiry_window")]
    pub expiry_window_days: i64,
}

fn default_notify_ttl() -> u64 {
    4000
}

fn default_search_debounce() -> u64 {
    500
}

fn default_low_stock() -> i64 {
    LOW_STOCK_THRESHOLD
}

fn default_expiry_window() -> i64 {
    DEFAULT_EXPIRY_WINDOW_DAYS
}

impl Default for UiSettings {
    fn default() -> Self {
        UiSettings {
            notify_ttl_ms: default_notify_ttl(),
            search_debounce_ms: default_search_debounce(),
            low_stock_threshold: default_low_stock(),
            expiry_window_days: default_expiry_window(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session file; `None` uses the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ClientError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.ui.notify_ttl_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "notify_ttl_ms must be greater than 0".into(),
            ));
        }

        if self.ui.low_stock_threshold < 0 {
            return Err(ClientError::InvalidConfig(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        if self.ui.expiry_window_days <= 0 {
            return Err(ClientError::InvalidConfig(
                "expiry_window_days must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(path) = lookup(ENV_SESSION_PATH) {
            self.session.path = Some(PathBuf::from(path));
        }

        if let Some(ttl) = lookup(ENV_NOTIFY_TTL) {
            match ttl.parse::<u64>() {
                Ok(ms) => self.ui.notify_ttl_ms = ms,
                Err(_) => warn!(value = %ttl, "Ignoring invalid {}", ENV_NOTIFY_TTL),
            }
        }

        if let Some(debounce) = lookup(ENV_SEARCH_DEBOUNCE) {
            match debounce.parse::<u64>() {
                Ok(ms) => self.ui.search_debounce_ms = ms,
                Err(_) => warn!(value = %debounce, "Ignoring invalid {}", ENV_SEARCH_DEBOUNCE),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("in", "pharmadesk", "PharmaDesk")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    pub fn notify_ttl(&self) -> Duration {
        Duration::from_millis(self.ui.notify_ttl_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.ui.search_debounce_ms)
    }

    /// Session file: configured path, else the platform data directory.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session.path.clone().or_else(|| {
            Self::project_dirs().map(|dirs| dirs.data_dir().join("session.json"))
        })
    }
}
