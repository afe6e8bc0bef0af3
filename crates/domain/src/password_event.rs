//! Password change events and the RFC 3339 timestamps they carry.

use chrono::{DateTime, SecondsFormat, Utc};
use passwatch_core::{AppError, AppResult};

use crate::Identity;

/// One password change reported by the directory audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChangeEvent {
    /// User who changed the password.
    pub actor: Identity,
    /// When the change happened.
    pub occurred_at: DateTime<Utc>,
}

impl PasswordChangeEvent {
    /// Creates an event from already validated parts.
    #[must_use]
    pub fn new(actor: Identity, occurred_at: DateTime<Utc>) -> Self {
        Self { actor, occurred_at }
    }

    /// Builds an event from the raw actor and timestamp strings of an audit
    /// entry.
    ///
    /// A timestamp that is not RFC 3339 is a format error for the whole
    /// batch; callers must not drop it silently.
    pub fn parse(actor: &str, raw_time: &str) -> AppResult<Self> {
        let actor = Identity::new(actor)?;
        let occurred_at = parse_timestamp(raw_time).map_err(|error| {
            AppError::Validation(format!(
                "password change event for '{actor}' has an invalid timestamp: {error}"
            ))
        })?;

        Ok(Self { actor, occurred_at })
    }
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid timestamp '{value}': {error}")))
}

/// Formats a timestamp as RFC 3339 UTC with a `Z` suffix and only as much
/// sub-second precision as the value carries.
#[must_use]
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
