//! JsonLinesLog - 追記専用のイベントログ（1 行 1 イベント）
//!
//! append ごとにファイル全体を書き直さない。`sync_data` してから返す。
//! 書きかけの最終行は `read_all` で無視し、次の `open` で切り詰める
//! （そのまま追記すると新しい行が書きかけの行とつながってしまう）。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::CompletionEvent;
use crate::error::FanoutError;
use crate::ports::EventLog;

pub struct JsonLinesLog {
    path: PathBuf,
    file: Mutex<fs::File>,
}

impl JsonLinesLog {
    /// Open `path` for appending, creating it if absent.
    ///
    /// A torn trailing line left by an interrupted append is cut off first,
    /// so the next event starts on a fresh line.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, FanoutError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| FanoutError::log_io(&path, e))?;

        let bytes = fs::read(&path)
            .await
            .map_err(|e| FanoutError::log_io(&path, e))?;
        if let Some(keep) = complete_len(&bytes) {
            warn!(
                path = %path.display(),
                dropped = bytes.len() - keep,
                "truncating torn trailing line in event log"
            );
            let repair = async {
                file.set_len(keep as u64).await?;
                file.sync_data().await
            };
            repair.await.map_err(|e| FanoutError::log_io(&path, e))?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Length to truncate to when `bytes` ends in a partial line, `None` if the
/// content already ends on a line boundary.
fn complete_len(bytes: &[u8]) -> Option<usize> {
    match bytes.last() {
        None | Some(b'\n') => None,
        Some(_) => Some(bytes.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1)),
    }
}

#[async_trait]
impl EventLog for JsonLinesLog {
    async fn append(&self, event: &CompletionEvent) -> Result<(), FanoutError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        let write = async {
            file.write_all(&line).await?;
            file.flush().await?;
            file.sync_data().await
        };
        write.await.map_err(|e| FanoutError::log_io(&self.path, e))
    }

    async fn read_all(&self) -> Result<Vec<CompletionEvent>, FanoutError> {
        let bytes = fs::read(&self.path)
            .await
            .map_err(|e| FanoutError::log_io(&self.path, e))?;

        // 最後の '\n' より後ろは書きかけ
        let complete = match bytes.iter().rposition(|b| *b == b'\n') {
            Some(end) => &bytes[..end],
            None => return Ok(Vec::new()),
        };

        complete
            .split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(|line| {
                serde_json::from_slice(line).map_err(|source| FanoutError::LogCorrupt {
                    path: self.path.clone(),
                    source,
                })
            })
            .collect()
    }
}
