//! One audit cycle: load state, fetch events, reconcile, persist, notify.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use passwatch_core::AppResult;
use passwatch_domain::{
    ExpiryPolicy, ExpiryStatus, Identity, UserStateTable, classify, reconcile,
};

use crate::{EmailService, ExpiryNotice, PasswordEventSource, UserStateRepository};

/// Outcome counters for one audit cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditRunReport {
    /// Events returned by the audit source.
    pub events_fetched: usize,
    /// Users tracked after reconciliation.
    pub tracked_users: usize,
    /// Whether the merged state reached the store.
    pub state_persisted: bool,
    /// Warning emails delivered.
    pub warnings_sent: usize,
    /// Expiry emails delivered.
    pub expiry_notices_sent: usize,
    /// Notifications that failed to send.
    pub failed_deliveries: usize,
}

/// Application service that runs the password expiry audit.
#[derive(Clone)]
pub struct PasswordExpiryService {
    event_source: Arc<dyn PasswordEventSource>,
    state_repository: Arc<dyn UserStateRepository>,
    email_service: Arc<dyn EmailService>,
    policy: ExpiryPolicy,
    excluded: BTreeSet<Identity>,
}

impl PasswordExpiryService {
    /// Creates a new password expiry service.
    #[must_use]
    pub fn new(
        event_source: Arc<dyn PasswordEventSource>,
        state_repository: Arc<dyn UserStateRepository>,
        email_service: Arc<dyn EmailService>,
        policy: ExpiryPolicy,
        excluded: BTreeSet<Identity>,
    ) -> Self {
        Self {
            event_source,
            state_repository,
            email_service,
            policy,
            excluded,
        }
    }

    /// Runs one full cycle as of `now`.
    ///
    /// The merged state is persisted before any email goes out. State load
    /// and save failures and per-recipient delivery failures are logged and
    /// do not stop the run; a failed fetch does, before anything is written.
    pub async fn run_audit(&self, now: DateTime<Utc>) -> AppResult<AuditRunReport> {
        let existing = self.load_state().await;

        let since = self.policy.lookback_start(now);
        let events = self.event_source.fetch_password_changes(since).await?;
        info!(
            since = %since,
            event_count = events.len(),
            "fetched password change events"
        );

        let merged = reconcile(&existing, &events, &self.excluded);
        let state_persisted = self.save_state(&merged).await;

        let mut report = AuditRunReport {
            events_fetched: events.len(),
            tracked_users: merged.len(),
            state_persisted,
            ..AuditRunReport::default()
        };

        self.notify_users(now, &merged, &mut report).await;

        info!(
            tracked_users = report.tracked_users,
            warnings_sent = report.warnings_sent,
            expiry_notices_sent = report.expiry_notices_sent,
            failed_deliveries = report.failed_deliveries,
            state_persisted = report.state_persisted,
            "password expiry audit finished"
        );

        Ok(report)
    }

    async fn load_state(&self) -> UserStateTable {
        match self.state_repository.load_state().await {
            Ok(state) => {
                debug!(tracked_users = state.len(), "loaded persisted user state");
                state
            }
            Err(error) => {
                warn!(
                    error = %error,
                    "failed to load persisted user state, starting from empty state"
                );
                UserStateTable::new()
            }
        }
    }

    async fn save_state(&self, state: &UserStateTable) -> bool {
        match self.state_repository.save_state(state).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    error = %error,
                    "failed to persist user state, continuing with in-memory state"
                );
                false
            }
        }
    }

    async fn notify_users(
        &self,
        now: DateTime<Utc>,
        state: &UserStateTable,
        report: &mut AuditRunReport,
    ) {
        for record in state.records() {
            let assessment = classify(now, &record, &self.policy);
            debug!(
                identity = %record.identity,
                last_password_change = %record.last_password_change,
                days_remaining = assessment.days_remaining,
                status = assessment.status.as_str(),
                "classified user"
            );

            let Some(notice) = ExpiryNotice::for_assessment(&record.identity, &assessment) else {
                continue;
            };

            match self
                .email_service
                .send_email(&notice.recipient, &notice.subject, &notice.body)
                .await
            {
                Ok(()) => match assessment.status {
                    ExpiryStatus::Expired => {
                        report.expiry_notices_sent = report.expiry_notices_sent.saturating_add(1);
                        info!(identity = %record.identity, "password expired, user notified");
                    }
                    ExpiryStatus::Warning => {
                        report.warnings_sent = report.warnings_sent.saturating_add(1);
                        info!(
                            identity = %record.identity,
                            days_remaining = assessment.days_remaining,
                            "password expires soon, user notified"
                        );
                    }
                    ExpiryStatus::Ok => {}
                },
                Err(error) => {
                    report.failed_deliveries = report.failed_deliveries.saturating_add(1);
                    warn!(
                        identity = %record.identity,
                        status = assessment.status.as_str(),
                        error = %error,
                        "failed to send expiry notification"
                    );
                }
            }
        }
    }
}
