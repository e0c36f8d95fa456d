//! Reading Poller
//!
//! Keeps a `ReadingStore` in step with the backend. Each fetch takes the
//! next sequence number before the request goes out, so when a manual
//! refresh and a scheduled tick overlap, whichever was issued last wins
//! regardless of which response arrives first.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::{BackendError, ReadingSource};
use crate::readings::{ApplyOutcome, ReadingStore};
use crate::websocket::{ConnectionHub, SystemEvent, WsEvent};

/// Polls the backend on an interval and on demand
pub struct ReadingPoller {
    source: Arc<dyn ReadingSource>,
    store: Arc<ReadingStore>,
    hub: Option<Arc<ConnectionHub>>,
    interval: Duration,
    next_seq: AtomicU64,
    status: RwLock<PollStatus>,
}

/// Health of the polling loop
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStatus {
    /// Unix seconds of the last successful fetch
    pub last_success_at: Option<i64>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Result of one successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub seq: u64,
    pub fetched: usize,
    pub apply: ApplyOutcome,
}

impl ReadingPoller {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        store: Arc<ReadingStore>,
        hub: Option<Arc<ConnectionHub>>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            hub,
            interval,
            next_seq: AtomicU64::new(0),
            status: RwLock::new(PollStatus::default()),
        }
    }

    pub fn store(&self) -> &Arc<ReadingStore> {
        &self.store
    }

    pub async fn status(&self) -> PollStatus {
        self.status.read().await.clone()
    }

    /// Fetch once and offer the result to the store
    pub async fn refresh(&self) -> Result<PollOutcome, BackendError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.source.fetch_readings().await {
            Ok(readings) => {
                let fetched = readings.len();
                let apply = self.store.apply(seq, readings).await;
                self.record_success().await;

                if let ApplyOutcome::Applied {
                    latest_changed: true,
                    latest: Some(latest),
                } = &apply
                {
                    self.notify(WsEvent::latest_reading(latest.clone(), seq));
                }

                tracing::debug!(
                    seq,
                    fetched,
                    applied = matches!(apply, ApplyOutcome::Applied { .. }),
                    "Poll completed"
                );
                Ok(PollOutcome { seq, fetched, apply })
            }
            Err(e) => {
                self.record_failure(&e).await;
                Err(e)
            }
        }
    }

    async fn record_success(&self) {
        let mut status = self.status.write().await;
        let recovered = status.consecutive_failures > 0;
        status.last_success_at = Some(chrono::Utc::now().timestamp());
        status.consecutive_failures = 0;
        status.last_error = None;
        drop(status);

        if recovered {
            tracing::info!("Backend reachable again");
            self.notify(WsEvent::system(SystemEvent::PollRecovered, "Backend reachable again"));
        }
    }

    async fn record_failure(&self, error: &BackendError) {
        let mut status = self.status.write().await;
        status.consecutive_failures += 1;
        status.last_error = Some(error.to_string());
        let first = status.consecutive_failures == 1;
        drop(status);

        // Only the first failure in a run is pushed to clients
        if first {
            tracing::warn!(error = %error, "Polling backend failed");
            self.notify(WsEvent::system(SystemEvent::PollFailed, error.to_string()));
        } else {
            tracing::debug!(error = %error, "Polling backend still failing");
        }
    }

    fn notify(&self, event: WsEvent) {
        if let Some(hub) = &self.hub {
            hub.publish(event);
        }
    }

    /// Spawn the polling loop; the first fetch happens immediately
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tracing::info!(interval_secs = self.interval.as_secs(), "Starting reading poller");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                // Errors are already recorded; the next tick is the retry
                let _ = self.refresh().await;
            }
        })
    }
}
