//! Shared Error Types
//!
//! Error types used across the client. Every failure in this crate is
//! recoverable: callers log it, flag the affected resource and carry on.
//!
//! # Error Categories
//!
//! - `ApiError` - HTTP round-trips to the PHP backend
//! - `SyncError` - sync attempts and sync scheduling
//!
//! # Usage
//!
//! ```rust
//! use qualiflow::shared::error::{ApiError, SyncError};
//!
//! let error: SyncError = ApiError::NotAuthenticated.into();
//! assert!(error.to_string().contains("authenticated"));
//! let sync_error = SyncError::InvalidInterval(0);
//! assert!(sync_error.to_string().contains("interval"));
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync + Clone`, so they can be stored in
//! state records and sent across tasks.
use thiserror::Error;

/// Errors from the HTTP API client
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Transport failure: DNS, connection refused, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered `success: false`
    #[error("Request rejected: {message}")]
    Rejected {
        message: String,
        status: Option<u16>,
    },

    /// The response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The request needs credentials and none are set
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The request could not be built (bad URL, client setup)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether the failure is an authentication problem
    pub fn is_auth_error(&self) -> bool {
        match self {
            ApiError::NotAuthenticated => true,
            ApiError::Http { status, .. } => *status == 401 || *status == 403,
            ApiError::Rejected { status, .. } => matches!(status, Some(401) | Some(403)),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Errors from the sync layer
#[derive(Debug, Error, Clone)]
pub enum SyncError {
    /// Periodic sync intervals must be strictly positive
    #[error("invalid sync interval: {0} seconds")]
    InvalidInterval(u64),

    /// The sync operation failed talking to the server
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No user is signed in
    #[error("no user session")]
    NoSession,

    /// The sync state store task has stopped
    #[error("sync state store is closed")]
    StoreClosed,

    /// The resource is not registered with the sync manager
    #[error("unknown sync resource: {0}")]
    UnknownResource(String),

    /// Local persistence failed during a sync
    #[error("local storage error: {0}")]
    Storage(String),
}
