//! fanout-core
//!
//! Distribute a fixed batch of tasks across a pool of concurrent workers,
//! record each outcome in a shared state store, persist an append-only
//! history of completions, and render live progress while work is in flight.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, outcome, event, snapshot）
//! - **ports**: 抽象化レイヤー（Workload, EventLog, ProgressSink, Clock, IdGenerator）
//! - **impls**: ports の実装（SimulatedWorkload, JsonFileLog, JsonLinesLog, TerminalSink, ...）
//! - **queue**: worker が取り合う FIFO（WorkQueue）
//! - **store**: task name → outcome の共有ストア（SharedStateStore）
//! - **app**: worker / pool / observer / driver（AppBuilder, App）
//! - **config**: PoolConfig, LogFormat
//! - **error**: FanoutError

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod store;

pub use app::{App, AppBuilder, BuildError, RunSummary, WorkerReport};
pub use config::{LogFormat, PoolConfig};
pub use domain::{CompletionEvent, Outcome, Snapshot, Task, TaskSpec, TaskStatus};
pub use error::FanoutError;
pub use queue::WorkQueue;
pub use store::SharedStateStore;
