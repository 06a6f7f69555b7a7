//! Snapshot sinks for broadcaster tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::MetricsSnapshot;
use crate::error::BroadcastError;
use crate::port::SnapshotSink;

/// Keeps every delivered snapshot.
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Arc<MetricsSnapshot>>>,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.received.lock().len()
    }

    pub fn last(&self) -> Option<Arc<MetricsSnapshot>> {
        self.received.lock().last().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSink for RecordingSink {
    async fn deliver(&self, snapshot: Arc<MetricsSnapshot>) -> Result<(), BroadcastError> {
        self.received.lock().push(snapshot);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Accepts `accept` deliveries, then fails every one after.
pub struct FailingSink {
    accept: usize,
    attempts: AtomicUsize,
    closed: AtomicBool,
}

impl FailingSink {
    pub fn after(accept: usize) -> Arc<Self> {
        Arc::new(Self {
            accept,
            attempts: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSink for FailingSink {
    async fn deliver(&self, _snapshot: Arc<MetricsSnapshot>) -> Result<(), BroadcastError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n >= self.accept {
            return Err(BroadcastError::Closed);
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Accepts the first delivery, then never completes another.
#[derive(Default)]
pub struct StalledSink {
    attempts: AtomicUsize,
    closed: AtomicBool,
}

impl StalledSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSink for StalledSink {
    async fn deliver(&self, _snapshot: Arc<MetricsSnapshot>) -> Result<(), BroadcastError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
