//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod google_reports_event_source;
mod smtp_email_service;
mod yaml_user_state_repository;

pub use google_reports_event_source::{
    GOOGLE_P12_PASSWORD, GOOGLE_TOKEN_URL, GOOGLE_USER_ACCOUNTS_ACTIVITIES_URL,
    GoogleReportsEventSource, GoogleServiceAccount, REPORTS_AUDIT_SCOPE,
};
pub use smtp_email_service::{GMAIL_SMTP_HOST, GMAIL_SMTPS_PORT, SmtpEmailConfig, SmtpEmailService};
pub use yaml_user_state_repository::{DEFAULT_STATE_FILE_NAME, YamlUserStateRepository};
