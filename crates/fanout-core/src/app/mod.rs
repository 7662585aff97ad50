//! App - アプリケーション層
//!
//! ports / queue / store を組み合わせて run を実行します。
//!
//! # 主要コンポーネント
//! - **AppBuilder** / **App**: 構築と driver（投入 → 起動 → join → 停止）
//! - **Worker**: タスク実行ループ（pop→execute→update→append→task_done）
//! - **WorkerPool**: N 個の worker の起動と join
//! - **ProgressObserver**: snapshot の定期描画
//! - **RunSummary**: run の結果

pub mod builder;
pub mod observer;
pub mod pool;
pub mod status;
pub mod worker_loop;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::observer::{ObserverHandle, ProgressObserver};
pub use self::pool::WorkerPool;
pub use self::status::RunSummary;
pub use self::worker_loop::{Worker, WorkerContext, WorkerReport};
