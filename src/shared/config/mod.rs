//! Application configuration module
//!
//! `AppConfig` holds everything the client needs to reach the backend and
//! schedule syncs. It is built through `AppConfigBuilder` (validated) or
//! read from a TOML file; missing keys take their defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
/// Default periodic sync interval
pub const DEFAULT_SYNC_INTERVAL_SECONDS: u64 = 30;
/// Default session re-check interval
pub const DEFAULT_AUTH_RECHECK_SECONDS: u64 = 60;
/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 15;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API base URL
    pub server_url: String,
    /// Enable periodic background sync
    pub auto_sync: bool,
    /// Periodic sync interval in seconds
    pub sync_interval_seconds: u64,
    /// Resources the global sync manager tracks
    pub tracked_tables: Vec<String>,
    /// Session re-check interval in seconds
    pub auth_recheck_seconds: u64,
    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Local storage database file; platform data dir when unset
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            auto_sync: true,
            sync_interval_seconds: DEFAULT_SYNC_INTERVAL_SECONDS,
            tracked_tables: vec!["documents".to_string()],
            auth_recheck_seconds: DEFAULT_AUTH_RECHECK_SECONDS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            storage_path: None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.sync_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync_interval_seconds",
                message: "must be a positive number of seconds".to_string(),
            });
        }
        if self.auth_recheck_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth_recheck_seconds",
                message: "must be a positive number of seconds".to_string(),
            });
        }
        if self.tracked_tables.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "tracked_tables",
                message: "table names cannot be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    auto_sync: Option<bool>,
    sync_interval_seconds: Option<u64>,
    tracked_tables: Option<Vec<String>>,
    auth_recheck_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
    storage_path: Option<PathBuf>,
}

impl AppConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            server_url: Some(config.server_url),
            auto_sync: Some(config.auto_sync),
            sync_interval_seconds: Some(config.sync_interval_seconds),
            tracked_tables: Some(config.tracked_tables),
            auth_recheck_seconds: Some(config.auth_recheck_seconds),
            request_timeout_seconds: Some(config.request_timeout_seconds),
            storage_path: config.storage_path,
        }
    }

    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync = Some(enabled);
        self
    }

    pub fn sync_interval_seconds(mut self, seconds: u64) -> Self {
        self.sync_interval_seconds = Some(seconds);
        self
    }

    pub fn tracked_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracked_tables = Some(tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn auth_recheck_seconds(mut self, seconds: u64) -> Self {
        self.auth_recheck_seconds = Some(seconds);
        self
    }

    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = Some(seconds);
        self
    }

    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: self
                .server_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.server_url),
            auto_sync: self.auto_sync.unwrap_or(defaults.auto_sync),
            sync_interval_seconds: self
                .sync_interval_seconds
                .unwrap_or(defaults.sync_interval_seconds),
            tracked_tables: self.tracked_tables.unwrap_or(defaults.tracked_tables),
            auth_recheck_seconds: self
                .auth_recheck_seconds
                .unwrap_or(defaults.auth_recheck_seconds),
            request_timeout_seconds: self
                .request_timeout_seconds
                .unwrap_or(defaults.request_timeout_seconds),
            storage_path: self.storage_path,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("failed to read configuration: {0}")]
    Io(String),
}
