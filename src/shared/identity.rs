//! User identifier normalization
//!
//! Callers hand the sync layer user identity in several shapes: a raw id
//! string, a full user record, or nothing at all. `UserIdInput` names those
//! shapes explicitly and `extract_user_id` turns any of them into a
//! canonical `UserId` without ever failing.

use crate::shared::records::User;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical, non-empty user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a raw identifier. Surrounding whitespace is trimmed and blank
    /// values are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything a caller may pass where a user is expected
#[derive(Debug, Clone, PartialEq)]
pub enum UserIdInput {
    RawId(String),
    UserRecord(User),
    Absent,
}

impl UserIdInput {
    /// Total conversion to a canonical identifier.
    ///
    /// A user record yields its `id`, or its `email` when the id is blank.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            UserIdInput::RawId(raw) => UserId::parse(raw),
            UserIdInput::UserRecord(user) => {
                UserId::parse(&user.id).or_else(|| UserId::parse(&user.email))
            }
            UserIdInput::Absent => None,
        }
    }
}

impl From<&str> for UserIdInput {
    fn from(raw: &str) -> Self {
        UserIdInput::RawId(raw.to_string())
    }
}

impl From<String> for UserIdInput {
    fn from(raw: String) -> Self {
        UserIdInput::RawId(raw)
    }
}

impl From<User> for UserIdInput {
    fn from(user: User) -> Self {
        UserIdInput::UserRecord(user)
    }
}

impl From<&User> for UserIdInput {
    fn from(user: &User) -> Self {
        UserIdInput::UserRecord(user.clone())
    }
}

impl<T: Into<UserIdInput>> From<Option<T>> for UserIdInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(UserIdInput::Absent)
    }
}

/// Normalize any supported input to a `UserId`
pub fn extract_user_id(input: impl Into<UserIdInput>) -> Option<UserId> {
    input.into().user_id()
}
