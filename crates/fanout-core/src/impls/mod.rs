//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **SimulatedWorkload**: sleep するだけのタスク本体
//! - **JsonFileLog**: JSON 配列ファイル（デフォルト）
//! - **JsonLinesLog**: 追記専用 JSON Lines
//! - **MemoryLog**: テスト・組み込み用
//! - **TerminalSink**, **TracingSink**: 進捗の描画先

pub mod json_file_log;
pub mod jsonl_log;
pub mod memory_log;
pub mod simulated;
pub mod terminal_sink;
pub mod tracing_sink;

pub use self::json_file_log::JsonFileLog;
pub use self::jsonl_log::JsonLinesLog;
pub use self::memory_log::MemoryLog;
pub use self::simulated::SimulatedWorkload;
pub use self::terminal_sink::TerminalSink;
pub use self::tracing_sink::TracingSink;
