//! Completion events written to the durable log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{RunId, WorkerId};
use super::task::TaskStatus;

/// One finished task, as persisted.
///
/// Field names are the on-disk keys: `worker`, `task`, `status`, `result`,
/// `start`, `end`. Timestamps serialize as RFC 3339 UTC, which sorts
/// lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub run: RunId,
    pub worker: WorkerId,
    pub task: String,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CompletionEvent {
    pub fn elapsed(&self) -> chrono::Duration {
        self.end - self.start
    }
}
