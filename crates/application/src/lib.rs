//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod expiry_notice;
mod password_expiry_service;

pub use audit_ports::{EmailService, PasswordEventSource, UserStateRepository};
pub use expiry_notice::{EXPIRY_NOTICE_SUBJECT, ExpiryNotice, PASSWORD_RESET_HELP_URL};
pub use password_expiry_service::{AuditRunReport, PasswordExpiryService};
