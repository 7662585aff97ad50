//! MemoryLog - プロセス内のイベントログ（テスト・組み込み用）

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::CompletionEvent;
use crate::error::FanoutError;
use crate::ports::EventLog;

#[derive(Default)]
pub struct MemoryLog {
    events: Mutex<Vec<CompletionEvent>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl EventLog for MemoryLog {
    async fn append(&self, event: &CompletionEvent) -> Result<(), FanoutError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<CompletionEvent>, FanoutError> {
        Ok(self.events.lock().await.clone())
    }
}
