//! ProgressObserver - store の snapshot を定期的に描画するループ
//!
//! # 状態遷移
//! - running: snapshot → render → interval 待ち、を繰り返す
//! - stopped: driver が全 worker の join 後に stop を送る。最後にもう一度
//!   描画してから終了する
//!
//! stop は watch channel で受け取る。interval の sleep と stop の変更を
//! select で待つので、停止の遅れは最大 1 interval。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::FanoutError;
use crate::ports::ProgressSink;
use crate::store::SharedStateStore;

pub struct ProgressObserver {
    store: Arc<SharedStateStore>,
    sink: Box<dyn ProgressSink>,
    interval: Duration,
}

impl ProgressObserver {
    pub fn new(store: Arc<SharedStateStore>, sink: Box<dyn ProgressSink>, interval: Duration) -> Self {
        Self {
            store,
            sink,
            interval,
        }
    }

    /// Start the loop on its own task.
    pub fn spawn(self) -> ObserverHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(stop_rx));
        ObserverHandle { stop_tx, join }
    }

    /// Returns how many snapshots were rendered.
    async fn run(mut self, mut stop_rx: watch::Receiver<bool>) -> usize {
        let mut renders = 0;
        loop {
            if *stop_rx.borrow() {
                break;
            }
            self.render_once().await;
            renders += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = stop_rx.changed() => {
                    // sender が drop された場合も停止扱い
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.render_once().await;
        renders += 1;
        debug!(renders, "observer stopped");
        renders
    }

    async fn render_once(&mut self) {
        let snapshot = self.store.snapshot().await;
        if let Err(err) = self.sink.render(&snapshot) {
            warn!(error = %err, "progress render failed");
        }
    }
}

pub struct ObserverHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<usize>,
}

impl ObserverHandle {
    pub fn request_stop(&self) {
        // ignore send error: the observer may already have exited
        let _ = self.stop_tx.send(true);
    }

    /// Stop the observer and wait for it; returns the number of renders.
    pub async fn stop_and_join(self) -> Result<usize, FanoutError> {
        self.request_stop();
        self.join
            .await
            .map_err(|e| FanoutError::ObserverPanicked(e.to_string()))
    }
}
