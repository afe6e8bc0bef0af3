use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use passwatch_core::{AppError, AppResult, NonEmptyString};
use passwatch_domain::{DEFAULT_RETENTION_DAYS, ExpiryPolicy, Identity};
use passwatch_infrastructure::DEFAULT_STATE_FILE_NAME;
use serde::Deserialize;
use tracing::{info, warn};

/// File name of the template written when the config directory is created.
pub const SAMPLE_CONFIG_FILE_NAME: &str = "sample-config.yaml";

/// Template written on first run.
pub const SAMPLE_CONFIG: &str = "\
# Service account with domain-wide delegation for the Admin Reports API.
service_account_email: passwords-audit@example.iam.gserviceaccount.com
# Service account key as downloaded from Google (.p12, password notasecret)
# or its RSA private key in PEM form.
service_account_p12: /etc/google-password-notifier/secret.p12
# Admin account the service account acts for.
delegated_email: admin@example.com
# Mailbox that sends notifications and its app password.
sender_email: alert@example.com
app_password: change-me
# Warn users this many days before their password expires.
treshold: 10
# Password validity period in days.
policy_numdays: 90
# Users that are never tracked or notified. Matched ignoring case.
users_excluded: []
# Persisted per-user state, relative to this file.
state_file: user-state.yaml
";

#[derive(Debug, Deserialize)]
struct NotifierConfigFile {
    service_account_email: NonEmptyString,
    app_password: NonEmptyString,
    delegated_email: NonEmptyString,
    #[serde(rename = "treshold", alias = "threshold")]
    warn_threshold_days: u32,
    sender_email: NonEmptyString,
    service_account_p12: PathBuf,
    #[serde(default)]
    users_excluded: Vec<Identity>,
    #[serde(default = "default_retention_days")]
    policy_numdays: u32,
    state_file: Option<PathBuf>,
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

/// Validated operator configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub service_account_email: String,
    pub app_password: String,
    pub delegated_email: String,
    pub sender_email: String,
    pub service_account_key_path: PathBuf,
    pub state_path: PathBuf,
    pub policy: ExpiryPolicy,
    pub excluded: BTreeSet<Identity>,
}

impl NotifierConfig {
    /// Loads configuration from `path`, writing a sample next to it when the
    /// directory does not exist yet.
    pub fn load(path: &Path) -> AppResult<Self> {
        let config_dir = config_dir(path);
        if let Some(sample_path) = bootstrap_config_dir(&config_dir)? {
            return Err(AppError::Configuration(format!(
                "config directory '{}' did not exist; created it with sample config '{}', \
                 fill it in and save it as '{}'",
                config_dir.display(),
                sample_path.display(),
                path.display()
            )));
        }

        let contents = fs::read_to_string(path).map_err(|error| {
            AppError::Configuration(format!(
                "failed to read config file '{}': {error}",
                path.display()
            ))
        })?;

        Self::from_yaml(&contents, &config_dir)
    }

    /// Parses and validates a YAML document. Relative paths are resolved
    /// against `config_dir`.
    pub fn from_yaml(contents: &str, config_dir: &Path) -> AppResult<Self> {
        let file: NotifierConfigFile = serde_yaml::from_str(contents)
            .map_err(|error| AppError::Configuration(format!("invalid config file: {error}")))?;

        let policy = ExpiryPolicy::new(file.policy_numdays, file.warn_threshold_days)?;
        let state_file = file
            .state_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE_NAME));

        Ok(Self {
            service_account_email: file.service_account_email.into(),
            app_password: file.app_password.into(),
            delegated_email: file.delegated_email.into(),
            sender_email: file.sender_email.into(),
            service_account_key_path: config_dir.join(file.service_account_p12),
            state_path: config_dir.join(state_file),
            policy,
            excluded: file.users_excluded.into_iter().collect(),
        })
    }
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn bootstrap_config_dir(config_dir: &Path) -> AppResult<Option<PathBuf>> {
    if config_dir.exists() {
        return Ok(None);
    }

    fs::create_dir_all(config_dir).map_err(|error| {
        AppError::Configuration(format!(
            "failed to create config directory '{}': {error}",
            config_dir.display()
        ))
    })?;

    let sample_path = config_dir.join(SAMPLE_CONFIG_FILE_NAME);
    if let Err(error) = fs::write(&sample_path, SAMPLE_CONFIG) {
        warn!(
            path = %sample_path.display(),
            error = %error,
            "failed to write sample config"
        );
    } else {
        info!(path = %sample_path.display(), "wrote sample config");
    }

    Ok(Some(sample_path))
}
