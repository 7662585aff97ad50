//! Run configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FanoutError;
use crate::impls::{JsonFileLog, JsonLinesLog};
use crate::ports::EventLog;

/// Pool configuration. Only `workers` and `poll_interval` affect the
/// concurrency contracts; the rest are tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub workers: usize,

    /// How often the observer snapshots the store.
    pub poll_interval: Duration,

    /// How long an idle worker waits on the queue before exiting.
    pub pop_timeout: Duration,

    /// `Some(n)` for a bounded queue.
    pub queue_capacity: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            poll_interval: Duration::from_secs(1),
            pop_timeout: Duration::from_secs(1),
            queue_capacity: None,
        }
    }
}

/// On-disk format of the durable log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One pretty-printed JSON array, rewritten atomically per append.
    #[default]
    Json,
    /// One JSON object per line, appended in place.
    JsonLines,
}

impl LogFormat {
    pub async fn open(self, path: &Path) -> Result<Arc<dyn EventLog>, FanoutError> {
        Ok(match self {
            LogFormat::Json => Arc::new(JsonFileLog::open(path).await?),
            LogFormat::JsonLines => Arc::new(JsonLinesLog::open(path).await?),
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(LogFormat::JsonLines),
            other => Err(format!("unknown log format {other:?} (expected json or jsonl)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::JsonLines => "jsonl",
        })
    }
}
