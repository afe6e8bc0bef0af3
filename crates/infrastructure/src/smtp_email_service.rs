//! SMTP email service using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use passwatch_application::EmailService;
use passwatch_core::{AppError, AppResult};
use tracing::debug;

/// Mail submission host used for notifications.
pub const GMAIL_SMTP_HOST: &str = "smtp.gmail.com";

/// Implicit TLS submission port.
pub const GMAIL_SMTPS_PORT: u16 = 465;

/// SMTP email service configuration.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

impl SmtpEmailConfig {
    /// Gmail submission over implicit TLS, authenticating as the sender with
    /// an app password.
    #[must_use]
    pub fn gmail(sender: impl Into<String>, app_password: impl Into<String>) -> Self {
        let sender = sender.into();
        Self {
            host: GMAIL_SMTP_HOST.to_owned(),
            port: GMAIL_SMTPS_PORT,
            username: sender.clone(),
            password: app_password.into(),
            from_address: sender,
        }
    }
}

/// Production email service using SMTP.
#[derive(Clone)]
pub struct SmtpEmailService {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Creates a new SMTP email service.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let from = parse_mailbox(config.from_address.as_str()).map_err(|error| {
            AppError::Configuration(format!("invalid sender_email: {error}"))
        })?;

        let credentials = Credentials::new(config.username, config.password);

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Configuration(format!("failed to create SMTP transport: {error}"))
            })?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self { from, mailer })
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(&self, to: &str, subject: &str, text_body: &str) -> AppResult<()> {
        let to_mailbox = parse_mailbox(to)?;

        let message = build_message(self.from.clone(), to_mailbox, subject, text_body)?;

        self.mailer
            .send(message)
            .await
            .map_err(|error| AppError::Delivery(format!("failed to send email to {to}: {error}")))?;

        debug!(to = to, subject = subject, "email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> AppResult<Mailbox> {
    address.parse::<Mailbox>().map_err(|error| {
        AppError::Delivery(format!("invalid email address '{address}': {error}"))
    })
}

fn build_message(from: Mailbox, to: Mailbox, subject: &str, text_body: &str) -> AppResult<Message> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(text_body.to_owned())
        .map_err(|error| AppError::Delivery(format!("failed to build email: {error}")))
}
