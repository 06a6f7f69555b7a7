//! Realtime snapshot broadcaster.
//!
//! Subscribers register a [`SnapshotSink`]; on every tick the broadcaster
//! takes one fresh snapshot and pushes it to all of them. A sink whose
//! delivery fails or times out is removed and closed. Delivery never happens
//! under the subscriber lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::MetricsSnapshot;
use crate::error::BroadcastError;
use crate::port::{SnapshotSink, SnapshotSource};

/// Opaque subscriber identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// No subscribers; no snapshot was taken.
    pub skipped: bool,
    pub delivered: usize,
    pub removed: usize,
}

pub struct RealtimeBroadcaster {
    source: Arc<dyn SnapshotSource>,
    subscribers: RwLock<HashMap<SubscriberId, Arc<dyn SnapshotSink>>>,
    interval: Duration,
    delivery_timeout: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeBroadcaster {
    #[must_use]
    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration, delivery_timeout: Duration) -> Self {
        Self {
            source,
            subscribers: RwLock::new(HashMap::new()),
            interval,
            delivery_timeout,
            ticker: Mutex::new(None),
        }
    }

    async fn deliver(
        &self,
        sink: &dyn SnapshotSink,
        snapshot: Arc<MetricsSnapshot>,
    ) -> Result<(), BroadcastError> {
        match tokio::time::timeout(self.delivery_timeout, sink.deliver(snapshot)).await {
            Ok(result) => result,
            Err(_) => Err(BroadcastError::Timeout {
                timeout_ms: self.delivery_timeout.as_millis() as u64,
            }),
        }
    }

    /// Push the current snapshot to `sink`, then register it.
    ///
    /// # Errors
    ///
    /// Returns the delivery error; the sink is closed and not registered.
    pub async fn subscribe(&self, sink: Arc<dyn SnapshotSink>) -> Result<SubscriberId, BroadcastError> {
        let snapshot = Arc::new(self.source.snapshot().await);
        if let Err(e) = self.deliver(sink.as_ref(), snapshot).await {
            warn!(error = %e, "Initial snapshot delivery failed");
            sink.close().await;
            return Err(e);
        }

        let id = SubscriberId::new();
        let count = {
            let mut subscribers = self.subscribers.write();
            subscribers.insert(id, sink);
            subscribers.len()
        };
        info!(subscriber = %id, subscribers = count, "Subscriber registered");
        Ok(id)
    }

    /// Remove and close a subscriber. Returns `false` if it was not registered.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id);
        match removed {
            Some(sink) => {
                sink.close().await;
                info!(subscriber = %id, "Subscriber removed");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// One broadcast round.
    ///
    /// Subscribers are copied under the read lock, the snapshot is taken and
    /// delivered with no lock held, then failed subscribers are removed in a
    /// single write pass. A subscriber that unsubscribed meanwhile may still
    /// receive this round's snapshot.
    pub async fn tick(&self) -> TickReport {
        let targets: Vec<(SubscriberId, Arc<dyn SnapshotSink>)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();
        if targets.is_empty() {
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        }

        let snapshot = Arc::new(self.source.snapshot().await);
        let results = join_all(targets.iter().map(|(id, sink)| {
            let snapshot = Arc::clone(&snapshot);
            async move { (*id, self.deliver(sink.as_ref(), snapshot).await) }
        }))
        .await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(subscriber = %id, error = %e, "Snapshot delivery failed");
                    failed.push(id);
                }
            }
        }

        let removed: Vec<Arc<dyn SnapshotSink>> = if failed.is_empty() {
            Vec::new()
        } else {
            let mut subscribers = self.subscribers.write();
            failed.iter().filter_map(|id| subscribers.remove(id)).collect()
        };
        for sink in &removed {
            sink.close().await;
        }

        let report = TickReport {
            skipped: false,
            delivered,
            removed: removed.len(),
        };
        debug!(
            delivered = report.delivered,
            removed = report.removed,
            "Broadcast tick finished"
        );
        report
    }

    /// Start the periodic ticker. A no-op when already running.
    pub fn start(self: &Arc<Self>) {
        let mut ticker = self.ticker.lock();
        if ticker.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let this = Arc::clone(self);
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(this.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; subscribers already got
            // their snapshot on subscribe.
            interval.tick().await;
            loop {
                interval.tick().await;
                this.tick().await;
            }
        }));
        info!(interval_secs = self.interval.as_secs(), "Broadcaster started");
    }

    /// Stop the ticker and close every subscriber.
    pub async fn stop(&self) {
        let handle = self.ticker.lock().take();
        if let Some(handle) = handle {
            handle.abort();
        }

        let sinks: Vec<Arc<dyn SnapshotSink>> =
            self.subscribers.write().drain().map(|(_, sink)| sink).collect();
        for sink in &sinks {
            sink.close().await;
        }
        info!(closed = sinks.len(), "Broadcaster stopped");
    }
}
