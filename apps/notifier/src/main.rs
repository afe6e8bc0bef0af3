//! Password expiry notifier.
//!
//! Audits password changes through the Google Admin Reports API, keeps the
//! last change per user next to the config file, and emails users whose
//! password is about to expire or already has.

#![forbid(unsafe_code)]

mod notifier_config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use passwatch_application::PasswordExpiryService;
use passwatch_core::{AppError, AppResult};
use passwatch_infrastructure::{
    GoogleReportsEventSource, GoogleServiceAccount, SmtpEmailConfig, SmtpEmailService,
    YamlUserStateRepository,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::notifier_config::NotifierConfig;

const HTTP_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Parser)]
#[command(
    name = "password-notifier",
    version,
    about = "Notifies users when their password is about to expire"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "PATH")]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    ExitCode::from(exit_status(&run(&cli).await))
}

/// Logs a failed run once and maps the outcome to the process exit status.
fn exit_status(result: &AppResult<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(error) => {
            error!(error = %error, "password expiry audit failed");
            1
        }
    }
}

async fn run(cli: &Cli) -> AppResult<()> {
    let config = NotifierConfig::load(&cli.config)?;
    info!(
        config = %cli.config.display(),
        retention_days = config.policy.retention_days(),
        warn_threshold_days = config.policy.warn_threshold_days(),
        excluded_users = config.excluded.len(),
        "password-notifier started"
    );

    let service = build_service(&config).await?;
    service.run_audit(Utc::now()).await?;

    Ok(())
}

async fn build_service(config: &NotifierConfig) -> AppResult<PasswordExpiryService> {
    let account = GoogleServiceAccount::from_key_file(
        config.service_account_email.as_str(),
        &config.service_account_key_path,
        config.delegated_email.as_str(),
    )
    .await?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let event_source = Arc::new(GoogleReportsEventSource::new(http_client, account)?);
    let state_repository = Arc::new(YamlUserStateRepository::new(config.state_path.clone()));
    let email_service = Arc::new(SmtpEmailService::new(SmtpEmailConfig::gmail(
        config.sender_email.as_str(),
        config.app_password.as_str(),
    ))?);

    Ok(PasswordExpiryService::new(
        event_source,
        state_repository,
        email_service,
        config.policy,
        config.excluded.clone(),
    ))
}

fn init_tracing(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
