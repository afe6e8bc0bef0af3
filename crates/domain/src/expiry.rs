//! Password expiry policy and per-user classification.

use chrono::{DateTime, Duration, Utc};
use passwatch_core::{AppError, AppResult};

use crate::UserRecord;

/// Default password validity period in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Extra days queried beyond the retention period so users whose last change
/// sits just outside the window are still found.
pub const LOOKBACK_MARGIN_DAYS: u32 = 30;

/// Longest accepted password validity period, one hundred years.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

const SECONDS_PER_DAY: i64 = 86_400;

/// Password validity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    retention_days: u32,
    warn_threshold_days: u32,
}

impl ExpiryPolicy {
    /// Creates a policy, requiring `0 < warn_threshold_days <= retention_days`
    /// and `retention_days <= MAX_RETENTION_DAYS`.
    pub fn new(retention_days: u32, warn_threshold_days: u32) -> AppResult<Self> {
        if retention_days == 0 {
            return Err(AppError::Configuration(
                "policy_numdays must be greater than zero".to_owned(),
            ));
        }

        if retention_days > MAX_RETENTION_DAYS {
            return Err(AppError::Configuration(format!(
                "policy_numdays ({retention_days}) must not exceed {MAX_RETENTION_DAYS}"
            )));
        }

        if warn_threshold_days == 0 {
            return Err(AppError::Configuration(
                "treshold must be greater than zero".to_owned(),
            ));
        }

        if warn_threshold_days > retention_days {
            return Err(AppError::Configuration(format!(
                "treshold ({warn_threshold_days}) must not exceed policy_numdays ({retention_days})"
            )));
        }

        Ok(Self {
            retention_days,
            warn_threshold_days,
        })
    }

    /// Returns the password validity period in days.
    #[must_use]
    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Returns how many days before expiry warnings start.
    #[must_use]
    pub fn warn_threshold_days(&self) -> u32 {
        self.warn_threshold_days
    }

    /// Returns the audit lookback window in days.
    #[must_use]
    pub fn lookback_days(&self) -> u32 {
        self.retention_days.saturating_add(LOOKBACK_MARGIN_DAYS)
    }

    /// Returns the oldest instant the audit query must cover.
    #[must_use]
    pub fn lookback_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.lookback_days()))
    }
}

/// Notification decision for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Password is comfortably within policy.
    Ok,
    /// Password expires within the warn threshold.
    Warning,
    /// Password is past the retention period.
    Expired,
}

impl ExpiryStatus {
    /// Returns the stable status label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Expired => "expired",
        }
    }
}

/// Classification result with the remaining day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryAssessment {
    /// Notification decision.
    pub status: ExpiryStatus,
    /// Days until expiry; negative once expired.
    pub days_remaining: i64,
}

/// Whole days elapsed between two instants, rounded toward negative infinity.
#[must_use]
pub fn days_elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Classifies one user against the policy.
///
/// Only a negative remaining count is expired. A remaining count equal to
/// the warn threshold is still ok.
#[must_use]
pub fn classify(now: DateTime<Utc>, record: &UserRecord, policy: &ExpiryPolicy) -> ExpiryAssessment {
    let elapsed = days_elapsed(record.last_password_change, now);
    let days_remaining = i64::from(policy.retention_days) - elapsed;

    let status = if days_remaining < 0 {
        ExpiryStatus::Expired
    } else if days_remaining < i64::from(policy.warn_threshold_days) {
        ExpiryStatus::Warning
    } else {
        ExpiryStatus::Ok
    };

    ExpiryAssessment {
        status,
        days_remaining,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::Identity;

    fn now() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single() {
            Some(value) => value,
            None => panic!("test timestamp out of range"),
        }
    }

    fn record_changed(days_ago: i64) -> UserRecord {
        let identity = match Identity::new("jane@example.com") {
            Ok(identity) => identity,
            Err(error) => panic!("test identity invalid: {error}"),
        };
        UserRecord {
            identity,
            last_password_change: now() - Duration::days(days_ago),
        }
    }

    fn policy() -> ExpiryPolicy {
        match ExpiryPolicy::new(90, 10) {
            Ok(policy) => policy,
            Err(error) => panic!("test policy invalid: {error}"),
        }
    }

    #[test]
    fn boundary_table_for_ninety_day_policy() {
        let cases = [
            (79, 11, ExpiryStatus::Ok),
            (80, 10, ExpiryStatus::Ok),
            (81, 9, ExpiryStatus::Warning),
            (90, 0, ExpiryStatus::Warning),
            (91, -1, ExpiryStatus::Expired),
        ];

        for (elapsed, remaining, status) in cases {
            let assessment = classify(now(), &record_changed(elapsed), &policy());
            assert_eq!(
                assessment,
                ExpiryAssessment {
                    status,
                    days_remaining: remaining,
                },
                "elapsed {elapsed} days"
            );
        }
    }

    #[test]
    fn zero_days_remaining_is_not_expired() {
        let assessment = classify(now(), &record_changed(90), &policy());
        assert_ne!(assessment.status, ExpiryStatus::Expired);
        assert_eq!(assessment.days_remaining, 0);
    }

    #[test]
    fn partial_days_are_floored() {
        let record = UserRecord {
            last_password_change: now() - Duration::days(80) - Duration::hours(23),
            ..record_changed(0)
        };
        let assessment = classify(now(), &record, &policy());
        assert_eq!(assessment.days_remaining, 10);
        assert_eq!(assessment.status, ExpiryStatus::Ok);
    }

    #[test]
    fn future_change_counts_as_negative_elapsed() {
        let future = now() + Duration::hours(1);
        assert_eq!(days_elapsed(future, now()), -1);
    }

    #[test]
    fn policy_rejects_invalid_thresholds() {
        assert!(matches!(
            ExpiryPolicy::new(0, 0),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            ExpiryPolicy::new(90, 0),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            ExpiryPolicy::new(30, 31),
            Err(AppError::Configuration(_))
        ));
        assert!(ExpiryPolicy::new(30, 30).is_ok());
    }

    #[test]
    fn policy_rejects_retention_beyond_maximum() {
        assert!(matches!(
            ExpiryPolicy::new(100_000_000, 10),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            ExpiryPolicy::new(MAX_RETENTION_DAYS + 1, 10),
            Err(AppError::Configuration(_))
        ));

        let Ok(longest) = ExpiryPolicy::new(MAX_RETENTION_DAYS, 10) else {
            panic!("maximum retention must be accepted");
        };
        assert_eq!(
            longest.lookback_start(now()),
            now() - Duration::days(i64::from(MAX_RETENTION_DAYS + LOOKBACK_MARGIN_DAYS))
        );
    }

    #[test]
    fn lookback_extends_retention_by_margin() {
        assert_eq!(policy().lookback_days(), 120);
        assert_eq!(
            policy().lookback_start(now()),
            now() - Duration::days(120)
        );
    }
}
