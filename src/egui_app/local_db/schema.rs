//! Database Schema Definitions
//!
//! The local store is a single key/value table, the native counterpart of
//! browser local storage.

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Key/value table holding persisted client state
pub const CREATE_LOCAL_STORAGE: &str = "CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Applied migrations
pub const CREATE_SCHEMA_MIGRATIONS: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

/// Check if database needs migration
pub fn needs_migration(current_version: i32) -> bool {
    current_version < CURRENT_SCHEMA_VERSION
}
