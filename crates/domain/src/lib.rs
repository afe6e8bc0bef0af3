//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod expiry;
mod password_event;
mod user;
mod user_state;

pub use expiry::{
    DEFAULT_RETENTION_DAYS, ExpiryAssessment, ExpiryPolicy, ExpiryStatus, LOOKBACK_MARGIN_DAYS,
    MAX_RETENTION_DAYS, classify, days_elapsed,
};
pub use password_event::{PasswordChangeEvent, format_timestamp, parse_timestamp};
pub use user::{Identity, UserRecord};
pub use user_state::{UserStateTable, reconcile};
