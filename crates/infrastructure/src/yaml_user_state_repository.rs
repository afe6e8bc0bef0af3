//! User state persisted as a YAML mapping next to the configuration file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use passwatch_application::UserStateRepository;
use passwatch_core::{AppError, AppResult};
use passwatch_domain::{Identity, UserStateTable, format_timestamp, parse_timestamp};
use tracing::{debug, info};

/// Default state file name, resolved against the configuration directory.
pub const DEFAULT_STATE_FILE_NAME: &str = "user-state.yaml";

/// File-backed state repository storing `identity: timestamp` pairs.
///
/// Keys are written in sorted order so successive files diff cleanly.
/// Writes go to a sibling temporary file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct YamlUserStateRepository {
    path: PathBuf,
}

impl YamlUserStateRepository {
    /// Creates a repository backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

#[async_trait]
impl UserStateRepository for YamlUserStateRepository {
    async fn load_state(&self) -> AppResult<UserStateTable> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(
                    path = %self.path.display(),
                    "no persisted user state yet, starting empty"
                );
                return Ok(UserStateTable::new());
            }
            Err(error) => {
                return Err(AppError::Storage(format!(
                    "failed to read user state '{}': {error}",
                    self.path.display()
                )));
            }
        };

        decode_state(&contents).map_err(|error| {
            AppError::Storage(format!(
                "user state '{}' is corrupt: {error}",
                self.path.display()
            ))
        })
    }

    async fn save_state(&self, state: &UserStateTable) -> AppResult<()> {
        let contents = encode_state(state)?;
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to write user state '{}': {error}",
                    temp_path.display()
                ))
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to replace user state '{}': {error}",
                    self.path.display()
                ))
            })?;

        debug!(
            path = %self.path.display(),
            tracked_users = state.len(),
            "persisted user state"
        );

        Ok(())
    }
}

fn encode_state(state: &UserStateTable) -> AppResult<String> {
    let document: BTreeMap<&str, String> = state
        .iter()
        .map(|(identity, changed_at)| (identity.as_str(), format_timestamp(*changed_at)))
        .collect();

    serde_yaml::to_string(&document)
        .map_err(|error| AppError::Storage(format!("failed to encode user state: {error}")))
}

fn decode_state(contents: &str) -> AppResult<UserStateTable> {
    if contents.trim().is_empty() {
        return Ok(UserStateTable::new());
    }

    let document: BTreeMap<String, String> = serde_yaml::from_str(contents)
        .map_err(|error| AppError::Validation(format!("invalid YAML mapping: {error}")))?;

    document
        .into_iter()
        .map(
            |(identity, changed_at)| -> AppResult<(Identity, DateTime<Utc>)> {
                Ok((Identity::new(identity)?, parse_timestamp(&changed_at)?))
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use passwatch_application::UserStateRepository;
    use passwatch_core::AppError;
    use passwatch_domain::{Identity, UserStateTable};
    use tempfile::TempDir;

    use super::{DEFAULT_STATE_FILE_NAME, YamlUserStateRepository};

    fn identity(value: &str) -> Identity {
        match Identity::new(value) {
            Ok(identity) => identity,
            Err(error) => panic!("test identity '{value}' is invalid: {error}"),
        }
    }

    fn timestamp() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 30).single() {
            Some(value) => value + Duration::milliseconds(250),
            None => panic!("test timestamp out of range"),
        }
    }

    fn temp_repository() -> (TempDir, YamlUserStateRepository) {
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temp dir: {error}"),
        };
        let repository = YamlUserStateRepository::new(temp_dir.path().join(DEFAULT_STATE_FILE_NAME));
        (temp_dir, repository)
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_state() {
        let (_temp_dir, repository) = temp_repository();
        let state = repository.load_state().await;
        assert_eq!(state.ok(), Some(UserStateTable::new()));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_unicode_identities() {
        let (_temp_dir, repository) = temp_repository();
        let state: UserStateTable = [
            (identity("jürgen.müller@exämple.de"), timestamp()),
            (identity("amy@example.com"), timestamp() - Duration::days(12)),
            (identity("zoë@example.com"), timestamp() + Duration::nanoseconds(1_500)),
        ]
        .into_iter()
        .collect();

        assert!(repository.save_state(&state).await.is_ok());
        let loaded = repository.load_state().await;

        assert_eq!(loaded.ok(), Some(state));
    }

    #[tokio::test]
    async fn saved_document_is_sorted_and_human_readable() {
        let (_temp_dir, repository) = temp_repository();
        let state: UserStateTable = [
            (identity("zed@example.com"), timestamp()),
            (identity("amy@example.com"), timestamp()),
        ]
        .into_iter()
        .collect();

        assert!(repository.save_state(&state).await.is_ok());
        let contents = tokio::fs::read_to_string(repository.path())
            .await
            .unwrap_or_default();

        let amy = contents.find("amy@example.com");
        let zed = contents.find("zed@example.com");
        assert!(amy.is_some() && zed.is_some() && amy < zed);
        assert_eq!(contents.matches("2024-03-01T08:15:30.250Z").count(), 2);
        assert!(!repository.temp_path().exists());
    }

    #[tokio::test]
    async fn save_replaces_previous_contents() {
        let (_temp_dir, repository) = temp_repository();
        let first: UserStateTable = [(identity("a@example.com"), timestamp())]
            .into_iter()
            .collect();
        let second: UserStateTable = [(identity("b@example.com"), timestamp())]
            .into_iter()
            .collect();

        assert!(repository.save_state(&first).await.is_ok());
        assert!(repository.save_state(&second).await.is_ok());

        assert_eq!(repository.load_state().await.ok(), Some(second));
    }

    #[tokio::test]
    async fn empty_file_loads_as_empty_state() {
        let (_temp_dir, repository) = temp_repository();
        assert!(tokio::fs::write(repository.path(), "").await.is_ok());
        assert_eq!(
            repository.load_state().await.ok(),
            Some(UserStateTable::new())
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let (_temp_dir, repository) = temp_repository();
        assert!(
            tokio::fs::write(repository.path(), "a@example.com: not-a-date\n")
                .await
                .is_ok()
        );
        assert!(matches!(
            repository.load_state().await,
            Err(AppError::Storage(_))
        ));

        assert!(tokio::fs::write(repository.path(), "- just\n- a list\n").await.is_ok());
        assert!(matches!(
            repository.load_state().await,
            Err(AppError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn unwritable_location_is_a_storage_error() {
        let (temp_dir, _) = temp_repository();
        let repository =
            YamlUserStateRepository::new(temp_dir.path().join("missing-dir").join("state.yaml"));

        let result = repository.save_state(&UserStateTable::new()).await;

        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
