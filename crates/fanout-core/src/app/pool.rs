use tokio::task::JoinHandle;
use tracing::error;

use super::worker_loop::{Worker, WorkerContext, WorkerReport};
use crate::domain::WorkerId;
use crate::error::FanoutError;

/// Worker group handle.
/// - 各 worker はキューが空になると自分で終了する（shutdown 信号は不要）
/// - `join()` で全ワーカーの終了を待てる
pub struct WorkerPool {
    joins: Vec<(WorkerId, JoinHandle<WorkerReport>)>,
}

impl WorkerPool {
    /// Spawn `n` workers named `worker-1 ..= worker-n`.
    pub fn spawn(n: usize, ctx: WorkerContext) -> Self {
        let mut joins = Vec::with_capacity(n);
        for i in 1..=n {
            let id = WorkerId::new(i as u32);
            let worker = Worker::new(id, ctx.clone());
            joins.push((id, tokio::spawn(worker.run())));
        }
        Self { joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Wait for every worker.
    ///
    /// Task bodies that panic are recorded as failed by the worker itself;
    /// a worker that still dies (e.g. a panicking log or store) does not stop
    /// the others. All handles are awaited and the first abnormal exit is
    /// then returned.
    pub async fn join(self) -> Result<Vec<WorkerReport>, FanoutError> {
        let mut reports = Vec::with_capacity(self.joins.len());
        let mut first_err = None;

        for (id, join) in self.joins {
            match join.await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(worker = %id, error = %err, "worker terminated abnormally");
                    first_err.get_or_insert(FanoutError::WorkerPanicked {
                        worker: id.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}
