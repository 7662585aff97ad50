//! Point-in-time copy of the state store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use super::task::TaskStatus;

/// Counts derived from a snapshot, for dashboards and summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounts {
    pub done: usize,
    pub failed: usize,
    /// Entries present in the snapshot (not tasks submitted).
    pub total: usize,
}

/// Independent copy of the store; later writes do not affect it.
///
/// Entries are sorted by task name so renders are stable between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: BTreeMap<String, Outcome>,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(entries: BTreeMap<String, Outcome>, taken_at: DateTime<Utc>) -> Self {
        Self { entries, taken_at }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.entries.get(name)
    }

    pub fn counts(&self) -> ProgressCounts {
        let mut counts = ProgressCounts {
            total: self.entries.len(),
            ..ProgressCounts::default()
        };
        for outcome in self.entries.values() {
            match outcome.status {
                TaskStatus::Done => counts.done += 1,
                TaskStatus::Failed => counts.failed += 1,
                TaskStatus::Pending | TaskStatus::Running => {}
            }
        }
        counts
    }

    /// Every entry is `done` or `failed`.
    pub fn all_terminal(&self) -> bool {
        self.entries.values().all(Outcome::is_terminal)
    }
}
