//! Client configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing default config file is not an error; the client starts on
//! compiled defaults. An explicitly requested file must exist and parse.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "CQ_API_URL";

/// Environment variable carrying the bearer token
pub const ENV_TOKEN: &str = "CQ_TOKEN";

/// Environment variable overriding the swipe distance threshold
pub const ENV_SWIPE_THRESHOLD: &str = "CQ_SWIPE_THRESHOLD";

/// Backend base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Horizontal drag distance a release must exceed to count as a decision
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 100.0;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    #[serde(default)]
    pub swipe_threshold: Option<f64>,

    #[serde(default)]
    pub event_capacity: Option<usize>,

    /// Speak newly shown candidates aloud
    #[serde(default)]
    pub tts_enabled: Option<bool>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file; must exist when given
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub swipe_threshold: Option<f64>,
    pub tts_enabled: Option<bool>,
    pub log_level: Option<String>,
}

/// Fully resolved client configuration
///
/// Read once when a session controller is built; nothing mutates it after.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub swipe_threshold: f64,
    pub event_capacity: usize,
    pub tts_enabled: bool,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            tts_enabled: false,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Resolve configuration from all sources
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = match &overrides.config_path {
            Some(path) => Some(load_toml_config(path)?),
            None => load_default_toml_config(),
        };

        let mut config = Self::default();
        if let Some(toml_config) = toml_config {
            config.apply_toml(toml_config);
        }
        config.apply_env()?;
        config.apply_overrides(overrides);
        config.validate()?;

        debug!(
            api_url = %config.api_url,
            swipe_threshold = config.swipe_threshold,
            tts_enabled = config.tts_enabled,
            "Client configuration resolved"
        );
        Ok(config)
    }

    /// Base URL joined with an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    fn apply_toml(&mut self, toml_config: TomlConfig) {
        if let Some(api_url) = toml_config.api_url {
            self.api_url = api_url;
        }
        if let Some(token) = non_empty(toml_config.token) {
            self.token = Some(token);
        }
        if let Some(ms) = toml_config.request_timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Some(threshold) = toml_config.swipe_threshold {
            self.swipe_threshold = threshold;
        }
        if let Some(capacity) = toml_config.event_capacity {
            self.event_capacity = capacity;
        }
        if let Some(tts) = toml_config.tts_enabled {
            self.tts_enabled = tts;
        }
        self.log_level = toml_config.logging.level;
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(api_url) = non_empty(std::env::var(ENV_API_URL).ok()) {
            self.api_url = api_url;
        }
        if let Some(token) = non_empty(std::env::var(ENV_TOKEN).ok()) {
            self.token = Some(token);
        }
        if let Some(raw) = non_empty(std::env::var(ENV_SWIPE_THRESHOLD).ok()) {
            self.swipe_threshold = raw.trim().parse::<f64>().map_err(|e| {
                Error::Config(format!("Invalid {} '{}': {}", ENV_SWIPE_THRESHOLD, raw, e))
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(api_url) = &overrides.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(token) = non_empty(overrides.token.clone()) {
            self.token = Some(token);
        }
        if let Some(threshold) = overrides.swipe_threshold {
            self.swipe_threshold = threshold;
        }
        if let Some(tts) = overrides.tts_enabled {
            self.tts_enabled = tts;
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api_url must not be empty".to_string()));
        }
        if !self.swipe_threshold.is_finite() || self.swipe_threshold <= 0.0 {
            return Err(Error::Config(format!(
                "swipe_threshold must be a positive number, got {}",
                self.swipe_threshold
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Platform config file location: `<config_dir>/collabquest/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("collabquest").join("config.toml"))
}

fn load_default_toml_config() -> Option<TomlConfig> {
    let path = default_config_path()?;
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return None;
    }
    match load_toml_config(&path) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring unreadable config file {}: {}", path.display(), e);
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
