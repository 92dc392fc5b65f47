use crate::engine::worker::Worker;
use crate::http::create_client;
use crate::target::Targeter;
use crate::types::{HitResult, RedirectPolicy};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Results hand off through a tight buffer so a slow consumer backpressures
/// workers instead of queueing results in memory.
const RESULT_CHANNEL_SIZE: usize = 1;

#[derive(Debug, Clone)]
pub struct AttackerConfig {
    /// Initial worker pool size.
    pub workers: usize,
    /// Ceiling for dynamic pool growth under a stalling backend.
    pub max_workers: usize,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub redirects: RedirectPolicy,
}

impl Default for AttackerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            max_workers: 4096,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            redirects: RedirectPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AttackError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Fires targets at a fixed rate for a fixed duration, streaming one
/// `HitResult` per dispatched tick.
pub struct Attacker {
    client: Client,
    workers: usize,
    max_workers: usize,
    redirects: RedirectPolicy,
    stop: CancellationToken,
}

impl Attacker {
    pub fn new(config: AttackerConfig) -> Result<Self, AttackError> {
        let workers = config.workers.max(1);
        let client = create_client(
            workers,
            config.timeout,
            config.connect_timeout,
            config.redirects,
        )?;

        Ok(Self {
            client,
            workers,
            max_workers: config.max_workers.max(workers),
            redirects: config.redirects,
            stop: CancellationToken::new(),
        })
    }

    /// Starts an attack of `rate * duration_secs` hits paced at `1/rate`
    /// second intervals. The returned stream is single-pass and closes once
    /// every dispatched tick has produced a result.
    pub fn attack(
        &self,
        targeter: Arc<dyn Targeter>,
        rate: u64,
        duration: Duration,
    ) -> mpsc::Receiver<HitResult> {
        let (result_tx, result_rx) = mpsc::channel(RESULT_CHANNEL_SIZE);

        let pacer = Pacer {
            client: self.client.clone(),
            redirects: self.redirects,
            targeter,
            workers: self.workers,
            max_workers: self.max_workers,
            rate,
            duration,
            stop: self.stop.clone(),
        };
        tokio::spawn(pacer.run(result_tx));

        result_rx
    }

    /// Requests cancellation of the running attack. Idempotent. In-flight
    /// hits complete and their results are emitted during the drain.
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

struct Pacer {
    client: Client,
    redirects: RedirectPolicy,
    targeter: Arc<dyn Targeter>,
    workers: usize,
    max_workers: usize,
    rate: u64,
    duration: Duration,
    stop: CancellationToken,
}

impl Pacer {
    async fn run(self, result_tx: mpsc::Sender<HitResult>) {
        if self.rate == 0 {
            tracing::warn!("attack rate is 0, nothing to pace");
            return;
        }

        let (tick_tx, tick_rx) = async_channel::bounded::<DateTime<Utc>>(1);
        let mut pool = JoinSet::new();
        for _ in 0..self.workers {
            self.spawn_worker(&mut pool, tick_rx.clone(), result_tx.clone());
        }

        let interval_ns = 1_000_000_000 / self.rate;
        let hits = self.rate.saturating_mul(self.duration.as_secs());
        let began = Instant::now();
        let began_wall = Utc::now();
        let mut ceiling_warned = false;

        tracing::info!(
            rate = self.rate,
            hits,
            workers = self.workers,
            "attack started"
        );

        let mut done: u64 = 0;
        'pacing: while done < hits {
            let next = began + Duration::from_nanos(done * interval_ns);
            tokio::select! {
                _ = time::sleep_until(next) => {}
                _ = self.stop.cancelled() => break 'pacing,
            }

            // A late tick carries its actual fire time instead of the
            // intended one.
            let tick = if Instant::now() > next {
                Utc::now()
            } else {
                began_wall + TimeDelta::nanoseconds((done * interval_ns) as i64)
            };

            loop {
                match tick_tx.try_send(tick) {
                    Ok(()) => break,
                    Err(async_channel::TrySendError::Full(_)) => {
                        if pool.len() < self.max_workers {
                            // Every worker is busy: add one and retry the
                            // same tick.
                            self.spawn_worker(&mut pool, tick_rx.clone(), result_tx.clone());
                            tokio::task::yield_now().await;
                        } else {
                            if !ceiling_warned {
                                tracing::warn!(
                                    max_workers = self.max_workers,
                                    "worker ceiling reached; pacing may stall"
                                );
                                ceiling_warned = true;
                            }
                            tokio::select! {
                                sent = tick_tx.send(tick) => {
                                    if sent.is_err() {
                                        break 'pacing;
                                    }
                                    break;
                                }
                                _ = self.stop.cancelled() => break 'pacing,
                            }
                        }
                    }
                    Err(async_channel::TrySendError::Closed(_)) => break 'pacing,
                }
            }

            done += 1;
        }

        // Close the tick source, let every worker finish its in-flight hit,
        // then drop our result sender so the stream closes behind them.
        drop(tick_tx);
        tracing::debug!(dispatched = done, pool = pool.len(), "draining workers");
        while pool.join_next().await.is_some() {}
        tracing::info!(hits = done, "attack finished");
    }

    fn spawn_worker(
        &self,
        pool: &mut JoinSet<()>,
        tick_rx: async_channel::Receiver<DateTime<Utc>>,
        result_tx: mpsc::Sender<HitResult>,
    ) {
        let worker = Worker::new(
            pool.len(),
            self.client.clone(),
            self.redirects,
            self.targeter.clone(),
            tick_rx,
            result_tx,
        );
        pool.spawn(worker.run());
    }
}
