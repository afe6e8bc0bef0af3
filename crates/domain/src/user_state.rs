//! Per-user password state and the merge of fresh audit events into it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{Identity, PasswordChangeEvent, UserRecord};

/// Mapping from identity to the most recent known password change.
///
/// Backed by a sorted map so iteration and persisted order are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStateTable {
    entries: BTreeMap<Identity, DateTime<Utc>>,
}

impl UserStateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored password change time for an identity.
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<DateTime<Utc>> {
        self.entries.get(identity).copied()
    }

    /// Returns whether the identity is tracked.
    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Returns the number of tracked users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no user is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates identities and timestamps in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &DateTime<Utc>)> {
        self.entries.iter()
    }

    /// Iterates tracked users as records in identity order.
    pub fn records(&self) -> impl Iterator<Item = UserRecord> + '_ {
        self.entries
            .iter()
            .map(|(identity, last_password_change)| UserRecord {
                identity: identity.clone(),
                last_password_change: *last_password_change,
            })
    }

    /// Applies one event, keeping it only when the actor is untracked or the
    /// event is strictly newer than the stored timestamp.
    ///
    /// Returns whether the table changed.
    pub fn observe(&mut self, event: &PasswordChangeEvent) -> bool {
        match self.entries.get(&event.actor) {
            Some(stored) if event.occurred_at <= *stored => {
                debug!(
                    identity = %event.actor,
                    stored = %stored,
                    event_time = %event.occurred_at,
                    "existing record is not older than event, skipping"
                );
                false
            }
            _ => {
                debug!(
                    identity = %event.actor,
                    event_time = %event.occurred_at,
                    "set password change time"
                );
                self.entries.insert(event.actor.clone(), event.occurred_at);
                true
            }
        }
    }

    /// Drops every excluded identity, ignoring case, and returns how many
    /// were removed.
    pub fn remove_excluded(&mut self, excluded: &BTreeSet<Identity>) -> usize {
        if excluded.is_empty() {
            return 0;
        }

        let excluded: BTreeSet<String> = excluded.iter().map(Identity::match_key).collect();
        let before = self.entries.len();
        self.entries
            .retain(|identity, _| !excluded.contains(&identity.match_key()));
        before - self.entries.len()
    }
}

impl FromIterator<(Identity, DateTime<Utc>)> for UserStateTable {
    fn from_iter<T: IntoIterator<Item = (Identity, DateTime<Utc>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Merges fresh events into existing state and removes excluded identities.
///
/// Most recent timestamp wins regardless of event order, so the result never
/// regresses a stored timestamp. Exclusions apply to pre-existing and newly
/// created records alike.
#[must_use]
pub fn reconcile(
    existing: &UserStateTable,
    events: &[PasswordChangeEvent],
    excluded: &BTreeSet<Identity>,
) -> UserStateTable {
    let mut merged = existing.clone();
    for event in events {
        merged.observe(event);
    }

    let removed = merged.remove_excluded(excluded);
    if removed > 0 {
        debug!(removed, "dropped excluded identities from user state");
    }

    merged
}
