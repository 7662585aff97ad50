//! EventLog port - 完了イベントの永続化
//!
//! # 契約
//! - `append` が返った時点でイベントは永続化済み
//! - 並行 append はシリアライズされる（壊れた/混ざった書き込みはない）
//! - 既存のイベントは保持される（追記のみ）
//!
//! 保存形式は実装側で決める（impls::JsonFileLog, impls::JsonLinesLog など）。

use async_trait::async_trait;

use crate::domain::CompletionEvent;
use crate::error::FanoutError;

#[async_trait]
pub trait EventLog: Send + Sync {
    /// Durably append one event.
    async fn append(&self, event: &CompletionEvent) -> Result<(), FanoutError>;

    /// Every completion event currently persisted, in append order.
    async fn read_all(&self) -> Result<Vec<CompletionEvent>, FanoutError>;
}
