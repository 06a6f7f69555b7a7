//! In-process subscriber backed by a bounded channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::MetricsSnapshot;
use crate::error::BroadcastError;
use crate::port::SnapshotSink;

pub struct ChannelSink {
    tx: mpsc::Sender<Arc<MetricsSnapshot>>,
}

impl ChannelSink {
    /// Sink plus the receiving end; dropping the receiver ends the subscription.
    #[must_use]
    pub fn new(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Arc<MetricsSnapshot>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl SnapshotSink for ChannelSink {
    async fn deliver(&self, snapshot: Arc<MetricsSnapshot>) -> Result<(), BroadcastError> {
        self.tx.send(snapshot).await.map_err(|_| BroadcastError::Closed)
    }
}
