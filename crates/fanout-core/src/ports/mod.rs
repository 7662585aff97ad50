//! Ports - 抽象化レイヤー
//!
//! Worker / Observer が依存する外部コラボレータの trait を定義します。
//! 実装は `impls` に置きます。
//!
//! - **Workload**: タスク本体
//! - **EventLog**: 完了イベントの永続化
//! - **ProgressSink**: 進捗の描画先
//! - **Clock**, **IdGenerator**: テストで差し替える時刻・ID

pub mod clock;
pub mod event_log;
pub mod id_generator;
pub mod progress_sink;
pub mod workload;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_log::EventLog;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::progress_sink::{NullSink, ProgressSink};
pub use self::workload::{Workload, WorkloadError};
