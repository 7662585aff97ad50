//! In-memory work queue.
//!
//! # 実装詳細
//! - `VecDeque<Task>` を tokio の Mutex で保護（ロックは pop/push の中で完結、
//!   ロックを跨いで await しない）
//! - `Notify` で push を待機中の worker に通知
//! - `try_pop` は必ず timeout 付き。`None` は「もう無い」の合図でエラーではない
//! - `unfinished` は push で +1、`task_done` で -1（drain の管理用）

use std::collections::VecDeque;
use std::pin::pin;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::Task;
use crate::error::FanoutError;

struct QueueState {
    items: VecDeque<Task>,
    /// Pushed but not yet reported via `task_done`.
    unfinished: usize,
}

pub struct WorkQueue {
    state: Mutex<QueueState>,
    capacity: Option<usize>,
    available: Notify,
    drained: Notify,
}

impl WorkQueue {
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// `push` fails with `QueueFull` once `capacity` items are queued.
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                unfinished: 0,
            }),
            capacity,
            available: Notify::new(),
            drained: Notify::new(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Add a task at the tail. Never blocks.
    pub async fn push(&self, task: Task) -> Result<(), FanoutError> {
        {
            let mut state = self.state.lock().await;
            if let Some(capacity) = self.capacity
                && state.items.len() >= capacity
            {
                return Err(FanoutError::QueueFull { capacity });
            }
            state.items.push_back(task);
            state.unfinished += 1;
        }
        // Notify outside the lock
        self.available.notify_one();
        Ok(())
    }

    /// Remove the head, waiting at most `timeout` for one to appear.
    ///
    /// Safe for any number of concurrent callers; an item is handed to exactly
    /// one of them.
    pub async fn try_pop(&self, timeout: Duration) -> Option<Task> {
        let deadline = Instant::now() + timeout;
        loop {
            // 先に待機登録してから確認する（push の通知を取りこぼさない）
            let mut notified = pin!(self.available.notified());
            notified.as_mut().enable();

            if let Some(task) = self.state.lock().await.items.pop_front() {
                return Some(task);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.state.lock().await.items.pop_front();
            }
        }
    }

    /// Report that a task obtained from `try_pop` has been fully processed.
    pub async fn task_done(&self) {
        let drained = {
            let mut state = self.state.lock().await;
            state.unfinished = state.unfinished.saturating_sub(1);
            state.unfinished == 0
        };
        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every pushed task has been reported via `task_done`.
    pub async fn join(&self) {
        loop {
            let mut notified = pin!(self.drained.notified());
            notified.as_mut().enable();
            if self.unfinished().await == 0 {
                return;
            }
            notified.await;
        }
    }

    pub async fn unfinished(&self) -> usize {
        self.state.lock().await.unfinished
    }

    /// Number of queued (not yet popped) tasks.
    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskSpec;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn task(name: &str) -> Task {
        Task::new(TaskSpec::new(name, 1).unwrap())
    }

    #[tokio::test]
    async fn push_pop_is_fifo() {
        let queue = WorkQueue::unbounded();
        queue.push(task("A")).await.unwrap();
        queue.push(task("B")).await.unwrap();

        let a = queue.try_pop(Duration::from_millis(10)).await.unwrap();
        let b = queue.try_pop(Duration::from_millis(10)).await.unwrap();
        assert_eq!(a.name(), "A");
        assert_eq!(b.name(), "B");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn pop_times_out_when_empty() {
        let queue = WorkQueue::unbounded();
        let start = Instant::now();

        let popped = queue.try_pop(Duration::from_millis(100)).await;

        assert!(popped.is_none());
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn push_wakes_pop() {
        let queue = Arc::new(WorkQueue::unbounded());

        let pop_future = tokio::spawn({
            let queue = queue.clone();
            async move { queue.try_pop(Duration::from_secs(5)).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.push(task("late")).await.unwrap();

        let popped = pop_future.await.unwrap();
        assert_eq!(popped.unwrap().name(), "late");
    }

    #[tokio::test]
    async fn bounded_queue_rejects_overflow() {
        let queue = WorkQueue::bounded(1);
        queue.push(task("A")).await.unwrap();

        let err = queue.push(task("B")).await.unwrap_err();
        assert!(matches!(err, FanoutError::QueueFull { capacity: 1 }));
        assert_eq!(queue.len().await, 1);
        assert_eq!(queue.capacity(), Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_poppers_never_share_an_item() {
        let queue = Arc::new(WorkQueue::unbounded());
        for i in 0..100 {
            queue.push(task(&format!("T{i}"))).await.unwrap();
        }

        let mut joins = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            joins.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(t) = queue.try_pop(Duration::from_millis(20)).await {
                    seen.push(t.name().to_string());
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for j in joins {
            all.extend(j.await.unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 100);
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test]
    async fn join_waits_for_task_done() {
        let queue = Arc::new(WorkQueue::unbounded());
        queue.push(task("A")).await.unwrap();
        queue.push(task("B")).await.unwrap();
        assert_eq!(queue.unfinished().await, 2);

        let consumer = tokio::spawn({
            let queue = queue.clone();
            async move {
                while queue.try_pop(Duration::from_millis(10)).await.is_some() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    queue.task_done().await;
                }
            }
        });

        tokio::time::timeout(Duration::from_secs(5), queue.join())
            .await
            .expect("join should return once both tasks are done");
        assert_eq!(queue.unfinished().await, 0);
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn join_on_empty_queue_returns_immediately() {
        let queue = WorkQueue::unbounded();
        tokio::time::timeout(Duration::from_millis(100), queue.join())
            .await
            .unwrap();
    }
}
