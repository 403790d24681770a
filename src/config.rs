//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.
//!
//! The backend base URL has no default: it is deployment configuration, and
//! without it every network operation fails with a configuration error.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::FileSessionStore;

/// Environment variable holding the backend base URL
pub const ENV_API_URL: &str = "BOXBOOK_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Booking backend connection
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// e.g. "https://boxes.example.com"; unset means "not configured"
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Characters of a failed response body kept in the error
    #[serde(default = "default_error_body_limit")]
    pub error_body_limit: usize,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_error_body_limit() -> usize {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            error_body_limit: default_error_body_limit(),
        }
    }
}

impl ApiConfig {
    /// Config pointing at the given backend
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Base URL without trailing slashes; `None` when unset or blank
    pub fn normalized_base_url(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where the session token is kept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Defaults to `<data_local_dir>/boxbook/session`
    #[serde(default)]
    pub file: Option<String>,
}

impl SessionConfig {
    pub fn path(&self) -> PathBuf {
        self.file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(FileSessionStore::default_path)
    }
}

/// Admin dashboard behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Auto-refresh interval; 0 disables auto-refresh
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    30
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.refresh_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("boxbook").join("config.toml")),
            Some(PathBuf::from("/etc/boxbook/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = Some(url);
        }
        if let Some(timeout) = lookup("BOXBOOK_API_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.api.request_timeout_secs = t;
            }
        }

        if let Some(file) = lookup("BOXBOOK_SESSION_FILE") {
            self.session.file = Some(file);
        }

        if let Some(secs) = lookup("BOXBOOK_REFRESH_SECS") {
            if let Ok(s) = secs.parse() {
                self.dashboard.refresh_interval_secs = s;
            }
        }

        if let Some(level) = lookup("BOXBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("BOXBOOK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Boxbook Configuration
#
# Environment variables override these settings:
# - BOXBOOK_API_URL
# - BOXBOOK_API_TIMEOUT_SECS
# - BOXBOOK_SESSION_FILE
# - BOXBOOK_REFRESH_SECS
# - BOXBOOK_LOG_LEVEL
# - BOXBOOK_LOG_FORMAT

[api]
# Booking backend base URL (required)
# base_url = "https://boxes.example.com"

# Request timeout in seconds
request_timeout_secs = 30

# Characters of an error response body kept in error messages
error_body_limit = 300

[session]
# File holding the bearer token
# file = "~/.local/share/boxbook/session"

[dashboard]
# Admin dashboard auto-refresh interval in seconds (0 = off)
refresh_interval_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
