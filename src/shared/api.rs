//! API response envelope
//!
//! Every PHP endpoint answers with the same JSON wrapper:
//! `{ "success": bool, "data"?: T, "message"?: string, "status"?: number }`.

use crate::shared::error::ApiError;
use serde::{Deserialize, Serialize};

/// Response wrapper returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    // A missing `data` is `None`; `default` here would demand `T: Default`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            status: None,
        }
    }

    /// Failed envelope carrying a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            status: None,
        }
    }

    /// Unwrap the envelope, turning `success: false` into an error
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| "request rejected by server".to_string()),
                status: self.status,
            })
        }
    }
}
