//! Shared primitives for all Rust crates in passwatch.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across passwatch crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
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

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Operator configuration is missing, unreadable or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Remote API rejected the supplied credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Persisted state could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// An outbound notification could not be delivered.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_deserialization_validates() {
        let parsed: Result<NonEmptyString, _> = serde_yaml::from_str("\"  \"");
        assert!(parsed.is_err());

        let parsed: Result<NonEmptyString, _> = serde_yaml::from_str("alert@example.com");
        assert_eq!(
            parsed.ok().map(String::from),
            Some("alert@example.com".to_owned())
        );
    }

    #[test]
    fn error_display_carries_category() {
        let error = AppError::Delivery("smtp closed connection".to_owned());
        assert_eq!(error.to_string(), "delivery error: smtp closed connection");
    }
}
