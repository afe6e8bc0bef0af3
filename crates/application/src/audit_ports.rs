use async_trait::async_trait;
use chrono::{DateTime, Utc};

use passwatch_core::AppResult;
use passwatch_domain::{PasswordChangeEvent, UserStateTable};

/// Source of password change events from the directory audit log.
#[async_trait]
pub trait PasswordEventSource: Send + Sync {
    /// Returns every password change recorded since `since`, in any order.
    ///
    /// Fails when an entry carries a malformed timestamp.
    async fn fetch_password_changes(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<PasswordChangeEvent>>;
}

/// Repository port for the persisted per-user state.
#[async_trait]
pub trait UserStateRepository: Send + Sync {
    /// Loads the persisted table. A store that does not exist yet loads as
    /// an empty table.
    async fn load_state(&self) -> AppResult<UserStateTable>;

    /// Replaces the persisted table.
    async fn save_state(&self, state: &UserStateTable) -> AppResult<()>;
}

/// Port for sending emails. Infrastructure provides the SMTP implementation.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text email.
    async fn send_email(&self, to: &str, subject: &str, text_body: &str) -> AppResult<()>;
}
