//! Shared Module
//!
//! Platform-agnostic types used throughout the client: record DTOs that
//! mirror the PHP API, the response envelope, identity normalization,
//! application events, errors and configuration.

/// Record data structures (documents, exigences, groups, members, users)
pub mod records;

/// API response envelope
pub mod api;

/// User identifier normalization
pub mod identity;

/// Application events and event bus
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use api::ApiEnvelope;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::{ApiError, SyncError};
pub use event::{AppEvent, EventBus, EventDetail, EventType, SyncTrigger};
pub use identity::{extract_user_id, UserId, UserIdInput};
pub use records::{ConformityStatus, Document, Exigence, Group, Member, SyncRecord, User};
