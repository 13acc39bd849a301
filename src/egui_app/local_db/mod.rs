//! # Local Storage Module
//!
//! Persisted client state in a local SQLite database. The store is a plain
//! string key/value map, mirroring browser local storage: the session token,
//! the current user, the user's role, the cached member list and the list of
//! tables the user works with.
//!
//! Structured values are JSON-encoded. Reading a structured value never
//! fails on bad data: a value that does not parse is logged and treated as
//! absent, so a corrupted entry degrades to "nothing stored".
//!
//! ## Usage
//!
//! ```rust,no_run
//! use qualiflow::egui_app::local_db::{keys, LocalStorage};
//!
//! # async fn example() -> Result<(), qualiflow::egui_app::local_db::StorageError> {
//! let storage = LocalStorage::in_memory().await?;
//! storage.set_item(keys::AUTH_TOKEN, "token-123").await?;
//! let tables: Vec<String> = storage.get_json_or(keys::USER_TABLES, Vec::new()).await;
//! # Ok(())
//! # }
//! ```

pub mod schema;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Well-known storage keys
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const CURRENT_USER: &str = "currentUser";
    pub const USER_ROLE: &str = "userRole";
    pub const MEMBRES: &str = "membres";
    pub const USER_TABLES: &str = "userTables";
}

/// Local storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for local storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Key/value store backed by SQLite
#[derive(Debug, Clone)]
pub struct LocalStorage {
    pool: SqlitePool,
}

impl LocalStorage {
    /// Open or create the store at `path`
    ///
    /// Parent directories are created as needed. Uses WAL mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        tracing::info!("Local storage opened at {}", path.display());
        Ok(storage)
    }

    /// Volatile store, used in tests
    ///
    /// A single connection that is never recycled keeps the in-memory
    /// database alive for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(schema::CREATE_SCHEMA_MIGRATIONS)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_LOCAL_STORAGE)
            .execute(&self.pool)
            .await?;

        let current_version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;

        if schema::needs_migration(current_version.0) {
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(schema::CURRENT_SCHEMA_VERSION)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Raw string value under `key`
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Store a raw string value
    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove every stored value
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM local_storage")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store a JSON-encoded value
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.set_item(key, &encoded).await
    }

    /// Decode a JSON value
    ///
    /// Missing keys, storage failures and malformed JSON all yield `None`;
    /// the last two are logged.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read '{}' from local storage: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed value under '{}': {}", key, e);
                None
            }
        }
    }

    /// Decode a JSON value, substituting `default` when absent or malformed
    pub async fn get_json_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_json(key).await.unwrap_or(default)
    }

    /// Number of stored keys
    pub async fn len(&self) -> Result<usize> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM local_storage")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
