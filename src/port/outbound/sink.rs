//! Snapshot delivery ports.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::MetricsSnapshot;
use crate::error::BroadcastError;

/// One live observer channel.
///
/// An error from [`deliver`](SnapshotSink::deliver) is final: the
/// broadcaster drops the sink and calls [`close`](SnapshotSink::close).
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn deliver(&self, snapshot: Arc<MetricsSnapshot>) -> Result<(), BroadcastError>;

    async fn close(&self) {}
}

/// Producer of fresh snapshots. Never fails; returns what it could gather.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> MetricsSnapshot;
}
