//! Key-value registry: single-node and cluster-node handles side by side.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::handle::{ConnectOutcome, HandleSet, Instance};
use crate::domain::{Family, FamilyStatus, KeyValueMode};
use crate::error::{BackendError, ConnectionError};
use crate::infrastructure::config::backend::RedisConfig;
use crate::port::{KeyValueClient, KeyValueConnector, KeyValueEndpoint};

type KeyValueHandles = HandleSet<dyn KeyValueClient, KeyValueEndpoint>;

/// Connected key-value node as handed to readers.
pub struct KeyValueTarget {
    pub name: String,
    pub mode: KeyValueMode,
    pub endpoint: KeyValueEndpoint,
    pub client: Arc<dyn KeyValueClient>,
}

pub struct KeyValueRegistry {
    connector: Arc<dyn KeyValueConnector>,
    timeout: Duration,
    single: KeyValueHandles,
    cluster: KeyValueHandles,
    config: RwLock<RedisConfig>,
    lifecycle: Mutex<()>,
}

fn instance_name(mode: KeyValueMode, endpoint: &KeyValueEndpoint) -> String {
    format!("{mode}:{}", endpoint.address())
}

fn instances(config: &RedisConfig, mode: KeyValueMode) -> Vec<Instance<KeyValueEndpoint>> {
    let endpoints: Vec<KeyValueEndpoint> = match mode {
        KeyValueMode::Single => config
            .single
            .iter()
            .map(|s| KeyValueEndpoint {
                host: s.host.clone(),
                port: s.port,
                password: s.password.clone(),
                database: s.database,
            })
            .collect(),
        KeyValueMode::Cluster => config
            .nodes
            .iter()
            .map(|n| KeyValueEndpoint {
                host: n.host.clone(),
                port: n.port,
                password: n.password.clone(),
                database: 0,
            })
            .collect(),
    };
    endpoints
        .into_iter()
        .map(|endpoint| Instance {
            name: instance_name(mode, &endpoint),
            meta: endpoint,
        })
        .collect()
}

impl KeyValueRegistry {
    /// `timeout` bounds each instance's connect plus liveness probe.
    pub fn new(connector: Arc<dyn KeyValueConnector>, timeout: Duration) -> Self {
        Self {
            connector,
            timeout,
            single: HandleSet::new(Family::Redis),
            cluster: HandleSet::new(Family::Redis),
            config: RwLock::new(RedisConfig::default()),
            lifecycle: Mutex::new(()),
        }
    }

    fn handles(&self, mode: KeyValueMode) -> &KeyValueHandles {
        match mode {
            KeyValueMode::Single => &self.single,
            KeyValueMode::Cluster => &self.cluster,
        }
    }

    async fn release(clients: Vec<Arc<dyn KeyValueClient>>) {
        for client in clients {
            client.close().await;
        }
    }

    async fn connect_mode(&self, config: &RedisConfig, mode: KeyValueMode) -> ConnectOutcome {
        let connector = &self.connector;
        self.handles(mode)
            .connect_all(instances(config, mode), self.timeout, |endpoint| async move {
                let client = connector.connect(&endpoint).await?;
                if let Err(e) = client.ping().await {
                    client.close().await;
                    return Err(e);
                }
                Ok::<_, BackendError>(client)
            })
            .await
    }

    async fn rebuild(&self, config: &RedisConfig) -> Result<(), ConnectionError> {
        let mut stale = self.single.drain();
        stale.extend(self.cluster.drain());
        Self::release(stale).await;

        *self.config.write() = config.clone();

        let (single, cluster) = tokio::join!(
            self.connect_mode(config, KeyValueMode::Single),
            self.connect_mode(config, KeyValueMode::Cluster),
        );
        let outcome = single.merge(cluster);
        info!(
            family = %Family::Redis,
            attempted = outcome.attempted,
            failed = outcome.failed,
            "Connect pass finished"
        );
        outcome.into_result(Family::Redis)
    }

    /// Build and probe one handle per configured single endpoint and cluster node.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NoInstanceReachable`] when instances are
    /// configured and none passed the probe. The registry stays usable.
    pub async fn connect(&self, config: &RedisConfig) -> Result<(), ConnectionError> {
        let _guard = self.lifecycle.lock().await;
        self.rebuild(config).await
    }

    /// Tear down every handle, then connect with `config`.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn reconnect(&self, config: &RedisConfig) -> Result<(), ConnectionError> {
        let _guard = self.lifecycle.lock().await;
        info!(family = %Family::Redis, "Reconnecting");
        self.rebuild(config).await
    }

    /// Release every connection. Idempotent.
    pub async fn close(&self) {
        let _guard = self.lifecycle.lock().await;
        let mut clients = self.single.disconnect_all();
        clients.extend(self.cluster.disconnect_all());
        if !clients.is_empty() {
            info!(family = %Family::Redis, count = clients.len(), "Closing connections");
        }
        Self::release(clients).await;
    }

    #[must_use]
    pub fn status(&self) -> FamilyStatus {
        let mut instances = self.single.statuses();
        instances.extend(self.cluster.statuses());
        FamilyStatus::new(Family::Redis, instances)
    }

    /// Connected nodes of one addressing mode.
    #[must_use]
    pub fn targets(&self, mode: KeyValueMode) -> Vec<KeyValueTarget> {
        self.handles(mode)
            .connected()
            .into_iter()
            .map(|(name, endpoint, client)| KeyValueTarget {
                name,
                mode,
                endpoint,
                client,
            })
            .collect()
    }

    #[must_use]
    pub fn is_connected(&self, mode: KeyValueMode) -> bool {
        self.handles(mode).any_connected()
    }

    /// Configured instances of one mode, connected or not.
    #[must_use]
    pub fn configured(&self, mode: KeyValueMode) -> usize {
        self.handles(mode).len()
    }

    /// `host:port` of every configured instance of `mode`.
    #[must_use]
    pub fn connection_info(&self, mode: KeyValueMode) -> Vec<String> {
        instances(&self.config.read(), mode)
            .into_iter()
            .map(|i| i.meta.address())
            .collect()
    }

    /// Candidate addresses for cluster-wide queries.
    #[must_use]
    pub fn cluster_addresses(&self) -> Vec<String> {
        let addresses = self.connection_info(KeyValueMode::Cluster);
        if addresses.is_empty() {
            warn!(family = %Family::Redis, "No cluster nodes configured");
        }
        addresses
    }

    /// Password of the first cluster node that has one.
    #[must_use]
    pub fn cluster_password(&self) -> String {
        self.config
            .read()
            .nodes
            .iter()
            .map(|n| n.password.clone())
            .find(|p| !p.is_empty())
            .unwrap_or_default()
    }
}
