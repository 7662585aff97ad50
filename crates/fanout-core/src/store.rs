//! Shared state store: task name -> latest outcome.
//!
//! 1 つの Mutex で map 全体を守る。worker 数は少なく、書き込みは
//! タスク実行時間に比べて稀なので、これで十分。

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Outcome, Snapshot};
use crate::ports::{Clock, SystemClock};

/// Single point of truth for "what has happened so far" in a run.
///
/// Keyed by task name: two tasks with the same name overwrite each other's
/// outcome (last writer wins).
pub struct SharedStateStore {
    data: Mutex<BTreeMap<String, Outcome>>,
    clock: Arc<dyn Clock>,
}

impl SharedStateStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    /// Insert or replace the outcome for `name` in one step.
    pub async fn update(&self, name: impl Into<String>, outcome: Outcome) {
        self.data.lock().await.insert(name.into(), outcome);
    }

    /// Independent copy of the whole map; later updates do not affect it.
    pub async fn snapshot(&self) -> Snapshot {
        let entries = self.data.lock().await.clone();
        Snapshot::new(entries, self.clock.now())
    }

    pub async fn get(&self, name: &str) -> Option<Outcome> {
        self.data.lock().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.data.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.lock().await.is_empty()
    }
}

impl Default for SharedStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    #[tokio::test]
    async fn update_then_snapshot() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let store = SharedStateStore::with_clock(Arc::new(FixedClock::new(at)));

        store.update("A", Outcome::done("A result 101")).await;

        let snap = store.snapshot().await;
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("A").unwrap().status, TaskStatus::Done);
        assert_eq!(snap.taken_at, at);
    }

    #[tokio::test]
    async fn snapshot_is_independent_of_later_writes() {
        let store = SharedStateStore::new();
        store.update("A", Outcome::done("first")).await;

        let snap = store.snapshot().await;
        store.update("A", Outcome::failed("second")).await;
        store.update("B", Outcome::done("b")).await;

        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("A").unwrap().result.as_deref(), Some("first"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn same_key_last_writer_wins() {
        let store = SharedStateStore::new();
        store.update("X", Outcome::done("one")).await;
        store.update("X", Outcome::done("two")).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("X").await.unwrap().result.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn empty_store_snapshots_cleanly() {
        let store = SharedStateStore::default();
        assert!(store.is_empty().await);
        assert!(store.snapshot().await.is_empty());
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_never_see_torn_records() {
        let store = Arc::new(SharedStateStore::new());

        let writer = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                for i in 0..500 {
                    let outcome = if i % 2 == 0 {
                        Outcome::done(format!("done-{i}"))
                    } else {
                        Outcome::failed(format!("failed-{i}"))
                    };
                    store.update("K", outcome).await;
                }
            }
        });

        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                for _ in 0..500 {
                    if let Some(o) = store.snapshot().await.get("K") {
                        let result = o.result.as_deref().unwrap();
                        match o.status {
                            TaskStatus::Done => assert!(result.starts_with("done-")),
                            TaskStatus::Failed => assert!(result.starts_with("failed-")),
                            other => panic!("unexpected status {other}"),
                        }
                    }
                    tokio::task::yield_now().await;
                }
            }
        });

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
