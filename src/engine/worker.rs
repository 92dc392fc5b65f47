use crate::http::execute_hit;
use crate::target::Targeter;
use crate::types::{HitResult, RedirectPolicy};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One member of the attack pool. Drains ticks until the pacer closes the
/// channel, emitting one result per tick.
pub(crate) struct Worker {
    id: usize,
    client: Client,
    redirects: RedirectPolicy,
    targeter: Arc<dyn Targeter>,
    tick_rx: async_channel::Receiver<DateTime<Utc>>,
    result_tx: mpsc::Sender<HitResult>,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        client: Client,
        redirects: RedirectPolicy,
        targeter: Arc<dyn Targeter>,
        tick_rx: async_channel::Receiver<DateTime<Utc>>,
        result_tx: mpsc::Sender<HitResult>,
    ) -> Self {
        Self {
            id,
            client,
            redirects,
            targeter,
            tick_rx,
            result_tx,
        }
    }

    pub(crate) async fn run(self) {
        tracing::debug!(worker = self.id, "worker started");

        while let Ok(tick) = self.tick_rx.recv().await {
            let result =
                execute_hit(&self.client, self.redirects, self.targeter.as_ref(), tick).await;

            if self.result_tx.send(result).await.is_err() {
                // Consumer dropped the stream; no point finishing the drain.
                break;
            }
        }

        tracing::debug!(worker = self.id, "worker stopped");
    }
}
