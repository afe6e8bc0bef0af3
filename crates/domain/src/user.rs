//! User identity and per-user password state.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use passwatch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Email-shaped directory identity used as the unique user key.
///
/// Construction trims surrounding whitespace and performs structural
/// validation only: exactly one `@` with non-empty local part and domain.
/// Case is preserved so identities are stored exactly as the directory
/// reports them; [`Identity::match_key`] gives the case-insensitive form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Creates a validated identity.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "identity must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(format!(
                "identity '{trimmed}' must contain an '@'"
            )));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "identity '{trimmed}' must have the form local@domain"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the lowercased form used when matching operator-supplied
    /// identities such as the exclusion list.
    #[must_use]
    pub fn match_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl TryFrom<String> for Identity {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

impl Display for Identity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Last known password change for one tracked user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Directory identity of the user.
    pub identity: Identity,
    /// Most recent password change observed for the user.
    pub last_password_change: DateTime<Utc>,
}
