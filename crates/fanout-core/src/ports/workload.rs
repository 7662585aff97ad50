//! Workload port - タスク本体の抽象化
//!
//! Worker はタスクの中身を知らない。`Workload` を差し替えれば、
//! sleep するだけのシミュレーションでも I/O でも同じ worker で動く。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TaskSpec;

/// Failure of a task body.
///
/// Converted into a `failed` outcome at the worker boundary; it never
/// escapes a worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WorkloadError {
    message: String,
}

impl WorkloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The work performed for one task.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Run the body for `spec` and return its result payload.
    async fn run(&self, spec: &TaskSpec) -> Result<String, WorkloadError>;
}
