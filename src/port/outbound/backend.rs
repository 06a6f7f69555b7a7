//! Backend client ports.
//!
//! Each family is reached through a connector that produces a shared client.
//! Clients never enforce the caller's deadline themselves; the registries and
//! the aggregator wrap every call in one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{BrokerMetadata, ConsumerGroupInfo, PartitionOffsets};
use crate::error::BackendError;
use crate::infrastructure::config::backend::{DatabaseEntry, KafkaConfig};

/// Address and credentials of one key-value node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueEndpoint {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub database: i64,
}

impl KeyValueEndpoint {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection to one key-value node.
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    async fn ping(&self) -> Result<(), BackendError>;

    /// `INFO` or `INFO <section>` status text.
    async fn info(&self, section: Option<&str>) -> Result<String, BackendError>;

    /// `CLUSTER NODES` listing.
    async fn cluster_nodes(&self) -> Result<String, BackendError>;

    /// `CLUSTER INFO` status text.
    async fn cluster_info(&self) -> Result<String, BackendError>;

    async fn close(&self) {}
}

#[async_trait]
pub trait KeyValueConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &KeyValueEndpoint,
    ) -> Result<Arc<dyn KeyValueClient>, BackendError>;
}

/// Metadata and consumer-group access to a log-broker cluster.
#[async_trait]
pub trait BrokerAdmin: Send + Sync {
    /// Succeeds when metadata lists at least one broker.
    async fn ping(&self) -> Result<(), BackendError>;

    async fn metadata(&self) -> Result<BrokerMetadata, BackendError>;

    async fn consumer_groups(&self) -> Result<Vec<ConsumerGroupInfo>, BackendError>;

    /// Committed offsets and high watermarks of `group` for the given
    /// `(topic, partition)` pairs. Partitions without a commit are omitted.
    async fn committed_offsets(
        &self,
        group: &str,
        partitions: &[(String, i32)],
    ) -> Result<Vec<PartitionOffsets>, BackendError>;

    async fn close(&self) {}
}

#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// `timeout` bounds every blocking client call the admin makes.
    async fn connect(
        &self,
        config: &KafkaConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn BrokerAdmin>, BackendError>;
}

/// Figures probed from one relational database. Zero when a probe failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationalStats {
    pub version: String,
    pub size_bytes: i64,
    pub table_count: i64,
    pub uptime_seconds: i64,
    /// Active connections (PostgreSQL) or connected threads (MySQL).
    pub connections: i64,
    /// Running threads; MySQL only.
    pub threads_running: i64,
    pub max_connections: i64,
}

impl RelationalStats {
    #[must_use]
    pub fn connection_percent(&self) -> f64 {
        if self.max_connections > 0 {
            self.connections as f64 / self.max_connections as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Pool over one relational database.
#[async_trait]
pub trait RelationalClient: Send + Sync {
    async fn ping(&self) -> Result<(), BackendError>;

    /// Run the metric probes. Individual probe failures are logged and leave
    /// their field at zero.
    async fn collect(&self) -> RelationalStats;

    async fn close(&self);
}

#[async_trait]
pub trait RelationalConnector: Send + Sync {
    async fn connect(&self, entry: &DatabaseEntry)
        -> Result<Arc<dyn RelationalClient>, BackendError>;
}
