//! Worker - キューが空になるまでタスクを実行するループ
//!
//! # フロー（1 タスクごと）
//! 1. `WorkQueue::try_pop(timeout)`。`None` なら終了
//! 2. start タイムスタンプ
//! 3. `Task::execute`（失敗も panic も failed outcome になる）
//! 4. end タイムスタンプ
//! 5. `SharedStateStore::update`
//! 6. `EventLog::append`
//! 7. `WorkQueue::task_done` して 1 に戻る
//!
//! store と log のロックを同時に持つことはない（5 と 6 は順番に行う）。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::{CompletionEvent, RunId, Task, TaskStatus, WorkerId};
use crate::ports::{Clock, EventLog, Workload};
use crate::queue::WorkQueue;
use crate::store::SharedStateStore;

/// Everything a worker shares with the rest of the pool.
#[derive(Clone)]
pub struct WorkerContext {
    pub run: RunId,
    pub queue: Arc<WorkQueue>,
    pub store: Arc<SharedStateStore>,
    pub log: Arc<dyn EventLog>,
    pub workload: Arc<dyn Workload>,
    pub clock: Arc<dyn Clock>,
    pub pop_timeout: Duration,
}

/// What one worker did before the queue drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: WorkerId,
    /// Tasks executed (done + failed).
    pub processed: usize,
    /// Tasks whose body failed.
    pub failed: usize,
    /// Completion events that could not be persisted.
    pub persistence_failures: usize,
}

impl WorkerReport {
    fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            processed: 0,
            failed: 0,
            persistence_failures: 0,
        }
    }
}

pub struct Worker {
    id: WorkerId,
    ctx: WorkerContext,
}

impl Worker {
    pub fn new(id: WorkerId, ctx: WorkerContext) -> Self {
        Self { id, ctx }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Drain the queue, then return.
    pub async fn run(self) -> WorkerReport {
        let mut report = WorkerReport::new(self.id);
        debug!(worker = %self.id, "worker started");

        while let Some(task) = self.ctx.queue.try_pop(self.ctx.pop_timeout).await {
            self.process(task, &mut report).await;
            self.ctx.queue.task_done().await;
        }

        debug!(
            worker = %self.id,
            processed = report.processed,
            "queue drained, worker exiting"
        );
        report
    }

    async fn process(&self, mut task: Task, report: &mut WorkerReport) {
        let start = self.ctx.clock.now();
        let outcome = task.execute(self.ctx.workload.as_ref()).await;
        let end = self.ctx.clock.now();

        report.processed += 1;
        if outcome.status == TaskStatus::Failed {
            report.failed += 1;
            warn!(
                worker = %self.id,
                task = %task.name(),
                error = outcome.result.as_deref().unwrap_or_default(),
                "task failed"
            );
        } else {
            debug!(worker = %self.id, task = %task.name(), "task done");
        }

        self.ctx.store.update(task.name(), outcome.clone()).await;

        let event = CompletionEvent {
            run: self.ctx.run,
            worker: self.id,
            task: task.name().to_string(),
            status: outcome.status,
            result: outcome.result,
            start,
            end,
        };
        // 永続化の失敗はこの worker のこの 1 件だけの失敗。
        // 別経路（tracing）で報告して残りのタスクは続ける。
        if let Err(err) = self.ctx.log.append(&event).await {
            report.persistence_failures += 1;
            error!(
                worker = %self.id,
                task = %event.task,
                error = %err,
                "failed to persist completion event"
            );
        }
    }
}
