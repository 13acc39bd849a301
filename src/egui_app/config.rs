use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

/// Env var pointing at an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "QUALIFLOW_CONFIG";
/// Env var overriding the API base URL
pub const API_URL_ENV: &str = "QUALIFLOW_API_URL";
/// Env var overriding the periodic sync interval (seconds)
pub const SYNC_INTERVAL_ENV: &str = "QUALIFLOW_SYNC_INTERVAL";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self {
            app: builder.build()?,
        })
    }

    /// Load the configuration: TOML file from `QUALIFLOW_CONFIG` if set,
    /// then environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => AppConfig::load(PathBuf::from(path).as_path())?,
            _ => AppConfig::default(),
        };

        let mut builder = AppConfigBuilder::from_config(base);
        if let Ok(url) = std::env::var(API_URL_ENV) {
            builder = builder.server_url(url);
        }
        if let Ok(raw) = std::env::var(SYNC_INTERVAL_ENV) {
            let seconds = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: "sync_interval_seconds",
                message: format!("'{}' is not a number of seconds", raw),
            })?;
            builder = builder.sync_interval_seconds(seconds);
        }
        Self::with_builder(builder)
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.server_url(), path)
        } else {
            format!("{}/{}", self.server_url(), path)
        }
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    pub fn auto_sync(&self) -> bool {
        self.app.auto_sync
    }

    pub fn sync_interval_seconds(&self) -> u64 {
        self.app.sync_interval_seconds
    }

    pub fn tracked_tables(&self) -> &[String] {
        &self.app.tracked_tables
    }

    pub fn auth_recheck_interval(&self) -> Duration {
        Duration::from_secs(self.app.auth_recheck_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_seconds)
    }

    /// Local storage database path
    ///
    /// Falls back to `<data dir>/qualiflow/local.db`.
    pub fn storage_path(&self) -> PathBuf {
        if let Some(ref path) = self.app.storage_path {
            return path.clone();
        }
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("qualiflow");
        path.push("local.db");
        path
    }
}
