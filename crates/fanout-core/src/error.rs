use std::path::PathBuf;

use thiserror::Error;

/// Crate-level error for fanout runs.
///
/// Task-body failures are *not* represented here: they are recorded as a
/// `failed` outcome by the worker (see `ports::workload::WorkloadError`).
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("invalid task {name:?}: {reason}")]
    InvalidTask { name: String, reason: String },

    #[error("work queue is full (capacity={capacity})")]
    QueueFull { capacity: usize },

    /// The durable log could not be read or written.
    #[error("event log {path}: {source}")]
    LogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The durable log exists but does not hold a valid document.
    #[error("event log {path} is corrupt: {source}")]
    LogCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode completion event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("worker {worker} terminated abnormally: {reason}")]
    WorkerPanicked { worker: String, reason: String },

    #[error("observer terminated abnormally: {0}")]
    ObserverPanicked(String),
}

impl FanoutError {
    pub(crate) fn log_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogIo {
            path: path.into(),
            source,
        }
    }

    /// Is this a failure of shared infrastructure (durable log) rather than
    /// a bad input?
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            FanoutError::LogIo { .. } | FanoutError::LogCorrupt { .. } | FanoutError::Encode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_errors_are_classified() {
        let io = FanoutError::log_io("x.json", std::io::Error::other("disk gone"));
        assert!(io.is_persistence());
        assert!(io.to_string().contains("x.json"));

        let full = FanoutError::QueueFull { capacity: 2 };
        assert!(!full.is_persistence());
        assert_eq!(full.to_string(), "work queue is full (capacity=2)");
    }
}
