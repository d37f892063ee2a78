//! Shared primitives for all Rust crates in Sitegate.

#![forbid(unsafe_code)]

/// Service identity credentials used against the site directory.
pub mod credentials;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use credentials::ClientCredentials;

/// Result type used across Sitegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller or service identity is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller or service identity is blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The remote site directory failed or answered unexpectedly.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the error detail must stay server-side.
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Internal(_))
    }
}
