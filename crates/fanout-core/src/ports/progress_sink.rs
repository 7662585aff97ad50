//! ProgressSink port - 進捗の描画先
//!
//! Observer は snapshot を取って sink に渡すだけ。表示方法
//! （ターミナル、ログ、メトリクス）は sink 側の責務。

use crate::domain::Snapshot;

pub trait ProgressSink: Send {
    /// Present one snapshot. Called once per polling interval.
    fn render(&mut self, snapshot: &Snapshot) -> std::io::Result<()>;
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn render(&mut self, _snapshot: &Snapshot) -> std::io::Result<()> {
        Ok(())
    }
}
