//! AppBuilder - run の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に設定を検証し、不正なら BuildError を返す
//! - 足りないコラボレータにはデフォルトを入れる
//!   (SimulatedWorkload, NullSink, SystemClock, UlidGenerator)
//! - EventLog だけは必須（どこに履歴を残すかは呼び出し側が決める）

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::observer::ProgressObserver;
use super::pool::WorkerPool;
use super::status::RunSummary;
use super::worker_loop::WorkerContext;
use crate::config::PoolConfig;
use crate::domain::{Task, TaskSpec};
use crate::error::FanoutError;
use crate::impls::SimulatedWorkload;
use crate::ports::{
    Clock, EventLog, IdGenerator, NullSink, ProgressSink, SystemClock, UlidGenerator, Workload,
};
use crate::queue::WorkQueue;
use crate::store::SharedStateStore;

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("poll interval must be non-zero")]
    ZeroPollInterval,

    #[error("queue pop timeout must be non-zero")]
    ZeroPopTimeout,

    #[error("bounded queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("no event log configured")]
    MissingEventLog,
}

/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .workers(4)
///     .log(Arc::new(JsonFileLog::open("system_log.json").await?))
///     .sink(TerminalSink::stdout())
///     .build()?;
/// let summary = app.run(tasks).await?;
/// ```
pub struct AppBuilder {
    config: PoolConfig,
    workload: Option<Arc<dyn Workload>>,
    log: Option<Arc<dyn EventLog>>,
    sink: Option<Box<dyn ProgressSink>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            workload: None,
            log: None,
            sink: None,
            clock: None,
            ids: None,
        }
    }

    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn pop_timeout(mut self, timeout: Duration) -> Self {
        self.config.pop_timeout = timeout;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    pub fn workload(mut self, workload: Arc<dyn Workload>) -> Self {
        self.workload = Some(workload);
        self
    }

    pub fn log(mut self, log: Arc<dyn EventLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let config = self.config;
        if config.workers == 0 {
            return Err(BuildError::ZeroWorkers);
        }
        if config.poll_interval.is_zero() {
            return Err(BuildError::ZeroPollInterval);
        }
        if config.pop_timeout.is_zero() {
            return Err(BuildError::ZeroPopTimeout);
        }
        if config.queue_capacity == Some(0) {
            return Err(BuildError::ZeroQueueCapacity);
        }
        let log = self.log.ok_or(BuildError::MissingEventLog)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        Ok(App {
            store: Arc::new(SharedStateStore::with_clock(Arc::clone(&clock))),
            workload: self
                .workload
                .unwrap_or_else(|| Arc::new(SimulatedWorkload::default())),
            sink: self.sink.unwrap_or_else(|| Box::new(NullSink)),
            config,
            log,
            clock,
            ids,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured run: queue + worker pool + state store + log + observer.
pub struct App {
    config: PoolConfig,
    store: Arc<SharedStateStore>,
    log: Arc<dyn EventLog>,
    workload: Arc<dyn Workload>,
    sink: Box<dyn ProgressSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl App {
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The store this app's workers write to; readable during and after `run`.
    pub fn store(&self) -> Arc<SharedStateStore> {
        Arc::clone(&self.store)
    }

    pub fn log(&self) -> Arc<dyn EventLog> {
        Arc::clone(&self.log)
    }

    /// Execute every task once and return when the queue is drained.
    ///
    /// Task names should be unique: the store is keyed by name, so duplicates
    /// overwrite each other there while the log keeps one event per task.
    /// With a bounded queue, more tasks than its capacity is a `QueueFull`
    /// error since all tasks are enqueued before workers start.
    pub async fn run(self, tasks: Vec<TaskSpec>) -> Result<RunSummary, FanoutError> {
        let run = self.ids.generate_run_id();
        let queue = Arc::new(match self.config.queue_capacity {
            Some(capacity) => WorkQueue::bounded(capacity),
            None => WorkQueue::unbounded(),
        });

        let submitted = tasks.len();
        let mut seen = HashSet::with_capacity(submitted);
        for spec in tasks {
            if !seen.insert(spec.name().to_string()) {
                warn!(
                    task = %spec.name(),
                    "duplicate task name; its store entry will be overwritten"
                );
            }
            queue.push(Task::new(spec)).await?;
        }

        info!(
            %run,
            tasks = submitted,
            workers = self.config.workers,
            "starting run"
        );

        let ctx = WorkerContext {
            run,
            queue: Arc::clone(&queue),
            store: Arc::clone(&self.store),
            log: self.log,
            workload: self.workload,
            clock: self.clock,
            pop_timeout: self.config.pop_timeout,
        };
        let pool = WorkerPool::spawn(self.config.workers, ctx);
        let observer =
            ProgressObserver::new(Arc::clone(&self.store), self.sink, self.config.poll_interval)
                .spawn();

        // 全 worker の終了を待ってから observer を止める（最終状態を描画させるため）
        let joined = pool.join().await;
        let renders = observer.stop_and_join().await;
        let reports = joined?;
        let renders = renders?;

        let summary = RunSummary {
            run,
            submitted,
            snapshot: self.store.snapshot().await,
            reports,
            renders,
        };
        info!(
            %run,
            processed = summary.processed(),
            failed = summary.failed(),
            persistence_failures = summary.persistence_failures(),
            "run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::MemoryLog;
    use rstest::rstest;

    fn builder() -> AppBuilder {
        AppBuilder::new().log(Arc::new(MemoryLog::new()))
    }

    #[test]
    fn test_build_success() {
        let app = builder().workers(2).build().unwrap();
        assert_eq!(app.config().workers, 2);
    }

    #[rstest]
    #[case(builder().workers(0), BuildError::ZeroWorkers)]
    #[case(builder().poll_interval(Duration::ZERO), BuildError::ZeroPollInterval)]
    #[case(builder().pop_timeout(Duration::ZERO), BuildError::ZeroPopTimeout)]
    #[case(builder().queue_capacity(0), BuildError::ZeroQueueCapacity)]
    #[case(AppBuilder::new(), BuildError::MissingEventLog)]
    fn test_build_rejects(#[case] builder: AppBuilder, #[case] expected: BuildError) {
        assert_eq!(builder.build().err(), Some(expected));
    }

    #[tokio::test]
    async fn bounded_queue_overflow_fails_the_run() {
        let app = builder()
            .queue_capacity(1)
            .workload(Arc::new(SimulatedWorkload::new(Duration::from_millis(1))))
            .build()
            .unwrap();
        let tasks = vec![
            TaskSpec::new("A", 1).unwrap(),
            TaskSpec::new("B", 1).unwrap(),
        ];

        let err = app.run(tasks).await.unwrap_err();
        assert!(matches!(err, FanoutError::QueueFull { capacity: 1 }));
    }
}
