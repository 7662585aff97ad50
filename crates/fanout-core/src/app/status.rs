//! Status - run の結果サマリ

use crate::domain::{ProgressCounts, RunId, Snapshot};

use super::worker_loop::WorkerReport;

/// What `App::run` hands back to the driver.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run: RunId,
    /// Tasks pushed onto the queue.
    pub submitted: usize,
    /// Store contents after every worker joined.
    pub snapshot: Snapshot,
    pub reports: Vec<WorkerReport>,
    /// Snapshots rendered by the observer (including the final one).
    pub renders: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.reports.iter().map(|r| r.processed).sum()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed).sum()
    }

    pub fn persistence_failures(&self) -> usize {
        self.reports.iter().map(|r| r.persistence_failures).sum()
    }

    pub fn counts(&self) -> ProgressCounts {
        self.snapshot.counts()
    }

    /// Every submitted task ran, reached a terminal state, and was persisted.
    pub fn is_complete(&self) -> bool {
        self.processed() == self.submitted
            && self.persistence_failures() == 0
            && self.snapshot.all_terminal()
    }
}
