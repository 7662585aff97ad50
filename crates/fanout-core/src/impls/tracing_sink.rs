//! TracingSink - 進捗を tracing イベントとして出す（ヘッドレス実行用）

use tracing::info;

use crate::domain::Snapshot;
use crate::ports::ProgressSink;

#[derive(Debug, Default)]
pub struct TracingSink {
    expected: Option<usize>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include `expected` (tasks submitted) in each event.
    pub fn with_expected(expected: usize) -> Self {
        Self {
            expected: Some(expected),
        }
    }
}

impl ProgressSink for TracingSink {
    fn render(&mut self, snapshot: &Snapshot) -> std::io::Result<()> {
        let counts = snapshot.counts();
        match self.expected {
            Some(expected) => info!(
                done = counts.done,
                failed = counts.failed,
                expected,
                "progress"
            ),
            None => info!(done = counts.done, failed = counts.failed, "progress"),
        }
        Ok(())
    }
}
