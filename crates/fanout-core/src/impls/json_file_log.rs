//! JsonFileLog - JSON 配列 1 ファイルのイベントログ
//!
//! # 実装詳細
//! - ファイル全体が 1 つの JSON 配列（pretty print）
//! - append は read-modify-write。log 単位の Mutex で直列化
//! - 書き込みは一時ファイル → fsync → rename なので、並行して読む側は
//!   古い配列か新しい配列のどちらかしか見ない
//! - 配列内の completion event 以外の要素もそのまま残す
//!
//! イベント数が少ない前提。多い場合は `JsonLinesLog` を使う。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::CompletionEvent;
use crate::error::FanoutError;
use crate::ports::EventLog;

pub struct JsonFileLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileLog {
    /// Open the log at `path`, creating an empty array if it does not exist.
    ///
    /// An existing file must already hold a JSON array.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, FanoutError> {
        let path = path.into();
        let exists = fs::try_exists(&path)
            .await
            .map_err(|e| FanoutError::log_io(&path, e))?;
        if exists {
            read_document(&path).await?;
        } else {
            write_document(&path, &[]).await?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventLog for JsonFileLog {
    async fn append(&self, event: &CompletionEvent) -> Result<(), FanoutError> {
        let entry = serde_json::to_value(event)?;

        let _guard = self.write_lock.lock().await;
        let mut entries = read_document(&self.path).await?;
        entries.push(entry);
        write_document(&self.path, &entries).await
    }

    async fn read_all(&self) -> Result<Vec<CompletionEvent>, FanoutError> {
        let entries = read_document(&self.path).await?;
        Ok(entries
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }
}

async fn read_document(path: &Path) -> Result<Vec<Value>, FanoutError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| FanoutError::log_io(path, e))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|source| FanoutError::LogCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_document(path: &Path, entries: &[Value]) -> Result<(), FanoutError> {
    let bytes = serde_json::to_vec_pretty(entries)?;
    let tmp = temp_path(path);

    let write = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await?;
        sync_parent_dir(path).await
    };
    write.await.map_err(|e| FanoutError::log_io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RunId, TaskStatus, WorkerId};
    use chrono::Utc;
    use std::sync::Arc;
    use ulid::Ulid;

    fn event(run: RunId, worker: u32, task: &str) -> CompletionEvent {
        let now = Utc::now();
        CompletionEvent {
            run,
            worker: WorkerId::new(worker),
            task: task.to_string(),
            status: TaskStatus::Done,
            result: Some(format!("{task} result 100")),
            start: now,
            end: now,
        }
    }

    #[tokio::test]
    async fn open_initializes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_log.json");

        let log = JsonFileLog::open(&path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "[]");
        assert!(log.read_all().await.unwrap().is_empty());
        assert_eq!(log.path(), path.as_path());
    }

    #[tokio::test]
    async fn reopen_preserves_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let run = RunId::from_ulid(Ulid::new());

        let log = JsonFileLog::open(&path).await.unwrap();
        log.append(&event(run, 1, "A")).await.unwrap();
        drop(log);

        let log = JsonFileLog::open(&path).await.unwrap();
        log.append(&event(run, 2, "B")).await.unwrap();

        let events = log.read_all().await.unwrap();
        let names: Vec<_> = events.iter().map(|e| e.task.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn foreign_entries_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, r#"[{"note": "hand written"}]"#).unwrap();

        let log = JsonFileLog::open(&path).await.unwrap();
        log.append(&event(RunId::from_ulid(Ulid::new()), 1, "A"))
            .await
            .unwrap();

        let raw: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["note"], "hand written");
        assert_eq!(log.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "[{\"worker\": ").unwrap();

        let err = JsonFileLog::open(&path).await.err().unwrap();
        assert!(matches!(err, FanoutError::LogCorrupt { .. }));
        assert!(err.is_persistence());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(JsonFileLog::open(dir.path().join("log.json")).await.unwrap());
        let run = RunId::from_ulid(Ulid::new());

        let mut joins = Vec::new();
        for i in 0..20u32 {
            let log = Arc::clone(&log);
            joins.push(tokio::spawn(async move {
                log.append(&event(run, i % 4 + 1, &format!("T{i}"))).await
            }));
        }
        for j in joins {
            j.await.unwrap().unwrap();
        }

        assert_eq!(log.read_all().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("log.json");

        let err = JsonFileLog::open(&path).await.err().unwrap();
        assert!(matches!(err, FanoutError::LogIo { .. }));
    }
}
