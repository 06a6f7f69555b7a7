//! In-memory backend connectors.
//!
//! Each fake is a cheap clonable handle: hand one clone to the code under
//! test as its connector and keep another to script failures and read
//! counters.
//!
//! - [`FakeKeyValue`] - Answers `INFO` and `CLUSTER` commands with canned
//!   text. Addresses can be marked down or unresponsive; `INFO` can be
//!   delayed.
//! - [`FakeBroker`] - Serves fixed metadata, groups and offsets.
//! - [`FakeRelational`] - Returns fixed stats. Databases can be marked down;
//!   collection can be delayed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::fixtures;
use crate::domain::{BrokerMetadata, ConsumerGroupInfo, Family, PartitionOffsets};
use crate::error::BackendError;
use crate::infrastructure::config::backend::{DatabaseEntry, KafkaConfig};
use crate::port::{
    BrokerAdmin, BrokerConnector, KeyValueClient, KeyValueConnector, KeyValueEndpoint,
    RelationalClient, RelationalConnector, RelationalStats,
};

fn refused(family: Family, what: &str) -> BackendError {
    BackendError::client(family, format!("{what}: connection refused"))
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

// ---------------------------------------------------------------------------
// FakeKeyValue
// ---------------------------------------------------------------------------

struct KeyValueState {
    info: RwLock<String>,
    cluster_nodes: RwLock<String>,
    cluster_info: RwLock<String>,
    down: RwLock<HashSet<String>>,
    unresponsive: RwLock<HashSet<String>>,
    info_delay: RwLock<Option<Duration>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeKeyValue {
    state: Arc<KeyValueState>,
}

impl Default for FakeKeyValue {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeKeyValue {
    /// Every node answers with [`fixtures::INFO`] and the three-master
    /// cluster listing.
    pub fn new() -> Self {
        Self {
            state: Arc::new(KeyValueState {
                info: RwLock::new(fixtures::INFO.to_string()),
                cluster_nodes: RwLock::new(fixtures::CLUSTER_NODES.to_string()),
                cluster_info: RwLock::new(fixtures::CLUSTER_INFO.to_string()),
                down: RwLock::new(HashSet::new()),
                unresponsive: RwLock::new(HashSet::new()),
                info_delay: RwLock::new(None),
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_info(&self, text: &str) {
        *self.state.info.write() = text.to_string();
    }

    /// An empty listing makes `CLUSTER NODES` fail as on a non-cluster node.
    pub fn set_cluster_nodes(&self, text: &str) {
        *self.state.cluster_nodes.write() = text.to_string();
    }

    /// Refuse connects and commands for `host:port`.
    pub fn set_down(&self, address: &str) {
        self.state.down.write().insert(address.to_string());
    }

    pub fn set_up(&self, address: &str) {
        self.state.down.write().remove(address);
        self.state.unresponsive.write().remove(address);
    }

    /// Accept connects for `host:port` but fail every command.
    pub fn set_unresponsive(&self, address: &str) {
        self.state.unresponsive.write().insert(address.to_string());
    }

    pub fn set_info_delay(&self, delay: Duration) {
        *self.state.info_delay.write() = Some(delay);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueConnector for FakeKeyValue {
    async fn connect(
        &self,
        endpoint: &KeyValueEndpoint,
    ) -> Result<Arc<dyn KeyValueClient>, BackendError> {
        let address = endpoint.address();
        if self.state.down.read().contains(&address) {
            return Err(refused(Family::Redis, &address));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeKeyValueClient {
            address,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeKeyValueClient {
    address: String,
    state: Arc<KeyValueState>,
}

impl FakeKeyValueClient {
    fn check(&self) -> Result<(), BackendError> {
        if self.state.down.read().contains(&self.address)
            || self.state.unresponsive.read().contains(&self.address)
        {
            return Err(refused(Family::Redis, &self.address));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueClient for FakeKeyValueClient {
    async fn ping(&self) -> Result<(), BackendError> {
        self.check()
    }

    async fn info(&self, _section: Option<&str>) -> Result<String, BackendError> {
        let delay = *self.state.info_delay.read();
        pause(delay).await;
        self.check()?;
        Ok(self.state.info.read().clone())
    }

    async fn cluster_nodes(&self) -> Result<String, BackendError> {
        self.check()?;
        let nodes = self.state.cluster_nodes.read().clone();
        if nodes.is_empty() {
            return Err(BackendError::client(
                Family::Redis,
                "ERR This instance has cluster support disabled",
            ));
        }
        Ok(nodes)
    }

    async fn cluster_info(&self) -> Result<String, BackendError> {
        self.check()?;
        Ok(self.state.cluster_info.read().clone())
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// FakeBroker
// ---------------------------------------------------------------------------

struct BrokerState {
    metadata: RwLock<BrokerMetadata>,
    groups: RwLock<Vec<ConsumerGroupInfo>>,
    offsets: RwLock<Vec<PartitionOffsets>>,
    down: AtomicBool,
    fail_groups: AtomicBool,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeBroker {
    state: Arc<BrokerState>,
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBroker {
    /// Serves [`fixtures::broker_metadata`] with one `billing` group.
    pub fn new() -> Self {
        Self {
            state: Arc::new(BrokerState {
                metadata: RwLock::new(fixtures::broker_metadata()),
                groups: RwLock::new(vec![fixtures::group("billing")]),
                offsets: RwLock::new(fixtures::offsets()),
                down: AtomicBool::new(false),
                fail_groups: AtomicBool::new(false),
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_metadata(&self, metadata: BrokerMetadata) {
        *self.state.metadata.write() = metadata;
    }

    pub fn set_down(&self, down: bool) {
        self.state.down.store(down, Ordering::SeqCst);
    }

    /// Make the consumer group listing fail.
    pub fn fail_groups(&self, fail: bool) {
        self.state.fail_groups.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnector for FakeBroker {
    async fn connect(
        &self,
        config: &KafkaConfig,
        _timeout: Duration,
    ) -> Result<Arc<dyn BrokerAdmin>, BackendError> {
        if self.state.down.load(Ordering::SeqCst) {
            return Err(refused(Family::Kafka, &config.brokers.join(",")));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeBrokerAdmin {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeBrokerAdmin {
    state: Arc<BrokerState>,
}

#[async_trait]
impl BrokerAdmin for FakeBrokerAdmin {
    async fn ping(&self) -> Result<(), BackendError> {
        if self.state.metadata.read().brokers.is_empty() {
            return Err(BackendError::client(Family::Kafka, "metadata lists no brokers"));
        }
        Ok(())
    }

    async fn metadata(&self) -> Result<BrokerMetadata, BackendError> {
        if self.state.down.load(Ordering::SeqCst) {
            return Err(refused(Family::Kafka, "metadata"));
        }
        Ok(self.state.metadata.read().clone())
    }

    async fn consumer_groups(&self) -> Result<Vec<ConsumerGroupInfo>, BackendError> {
        if self.state.fail_groups.load(Ordering::SeqCst) {
            return Err(BackendError::client(Family::Kafka, "group listing unavailable"));
        }
        Ok(self.state.groups.read().clone())
    }

    async fn committed_offsets(
        &self,
        _group: &str,
        partitions: &[(String, i32)],
    ) -> Result<Vec<PartitionOffsets>, BackendError> {
        Ok(self
            .state
            .offsets
            .read()
            .iter()
            .filter(|o| partitions.iter().any(|(t, p)| *t == o.topic && *p == o.partition))
            .cloned()
            .collect())
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// FakeRelational
// ---------------------------------------------------------------------------

struct RelationalState {
    stats: RwLock<RelationalStats>,
    down: RwLock<HashSet<String>>,
    collect_delay: RwLock<Option<Duration>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeRelational {
    state: Arc<RelationalState>,
}

impl Default for FakeRelational {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRelational {
    /// Every database reports [`fixtures::relational_stats`].
    pub fn new() -> Self {
        Self {
            state: Arc::new(RelationalState {
                stats: RwLock::new(fixtures::relational_stats()),
                down: RwLock::new(HashSet::new()),
                collect_delay: RwLock::new(None),
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    /// Refuse connects and pings for the database named `name`.
    pub fn set_down(&self, name: &str) {
        self.state.down.write().insert(name.to_string());
    }

    pub fn set_up(&self, name: &str) {
        self.state.down.write().remove(name);
    }

    pub fn set_collect_delay(&self, delay: Duration) {
        *self.state.collect_delay.write() = Some(delay);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationalConnector for FakeRelational {
    async fn connect(
        &self,
        entry: &DatabaseEntry,
    ) -> Result<Arc<dyn RelationalClient>, BackendError> {
        if self.state.down.read().contains(&entry.name) {
            return Err(refused(Family::PostgreSql, &entry.name));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeRelationalClient {
            name: entry.name.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeRelationalClient {
    name: String,
    state: Arc<RelationalState>,
}

#[async_trait]
impl RelationalClient for FakeRelationalClient {
    async fn ping(&self) -> Result<(), BackendError> {
        if self.state.down.read().contains(&self.name) {
            return Err(refused(Family::PostgreSql, &self.name));
        }
        Ok(())
    }

    async fn collect(&self) -> RelationalStats {
        let delay = *self.state.collect_delay.read();
        pause(delay).await;
        self.state.stats.read().clone()
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}
