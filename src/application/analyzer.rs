//! On-demand cluster topology and resource overview.
//!
//! Uses short-lived connections of its own so an overview never disturbs the
//! registry's long-lived handles.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::deadline::with_deadline;
use crate::domain::{bytes_to_human, ClusterOverview, ClusterState, ClusterTopology, Family};
use crate::error::{BackendError, ClusterQueryError};
use crate::port::{KeyValueClient, KeyValueConnector, KeyValueEndpoint};
use crate::protocol::{parse_cluster_nodes, parse_cluster_state, parse_info_map};

/// Resource figures read from one node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct NodeSample {
    total_memory: i64,
    used_memory: i64,
    connections: i64,
    ops_per_sec: i64,
}

pub struct ClusterTopologyAnalyzer {
    connector: Arc<dyn KeyValueConnector>,
    timeout: Duration,
}

fn endpoint(address: &str, password: &str) -> Result<KeyValueEndpoint, BackendError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| BackendError::client(Family::Redis, format!("invalid address '{address}'")))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| BackendError::client(Family::Redis, format!("invalid port in '{address}': {e}")))?;
    Ok(KeyValueEndpoint {
        host: host.to_string(),
        port,
        password: password.to_string(),
        database: 0,
    })
}

fn field(map: &std::collections::HashMap<String, String>, key: &str) -> i64 {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

impl ClusterTopologyAnalyzer {
    /// `timeout` bounds every connect and command issued for an overview.
    #[must_use]
    pub fn new(connector: Arc<dyn KeyValueConnector>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    async fn open(&self, address: &str, password: &str) -> Result<Arc<dyn KeyValueClient>, BackendError> {
        let endpoint = endpoint(address, password)?;
        with_deadline(Family::Redis, self.timeout, self.connector.connect(&endpoint)).await
    }

    /// `CLUSTER NODES` (required) and `CLUSTER INFO` (best effort) from one address.
    async fn fetch_topology_text(
        &self,
        address: &str,
        password: &str,
    ) -> Result<(String, String), BackendError> {
        let client = self.open(address, password).await?;
        let nodes = with_deadline(Family::Redis, self.timeout, client.cluster_nodes()).await;
        let state = match &nodes {
            Ok(_) => with_deadline(Family::Redis, self.timeout, client.cluster_info())
                .await
                .unwrap_or_else(|e| {
                    debug!(address, error = %e, "CLUSTER INFO unavailable");
                    String::new()
                }),
            Err(_) => String::new(),
        };
        client.close().await;
        Ok((nodes?, state))
    }

    /// Read memory, clients and stats from one node.
    ///
    /// Only the memory section is required; the others contribute zero when
    /// they fail.
    async fn sample_node(&self, address: &str, password: &str) -> Result<NodeSample, BackendError> {
        let client = self.open(address, password).await?;
        let memory = with_deadline(Family::Redis, self.timeout, client.info(Some("memory"))).await;
        let memory = match memory {
            Ok(text) => parse_info_map(&text),
            Err(e) => {
                client.close().await;
                return Err(e);
            }
        };

        let (clients, stats) = tokio::join!(
            with_deadline(Family::Redis, self.timeout, client.info(Some("clients"))),
            with_deadline(Family::Redis, self.timeout, client.info(Some("stats"))),
        );
        client.close().await;

        let clients = clients.map(|t| parse_info_map(&t)).unwrap_or_default();
        let stats = stats.map(|t| parse_info_map(&t)).unwrap_or_default();

        let system = field(&memory, "total_system_memory");
        Ok(NodeSample {
            total_memory: if system > 0 {
                system
            } else {
                field(&memory, "maxmemory")
            },
            used_memory: field(&memory, "used_memory"),
            connections: field(&clients, "connected_clients"),
            ops_per_sec: field(&stats, "instantaneous_ops_per_sec"),
        })
    }

    /// Topology and summed resource usage of the cluster behind `addresses`.
    ///
    /// Addresses are tried in order until one answers `CLUSTER NODES`. Every
    /// node of the resulting topology is then sampled concurrently; nodes
    /// that fail are left out of the totals.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterQueryError::NoAddresses`] for an empty list,
    /// [`ClusterQueryError::NoReachableAddress`] when no address answered, and
    /// [`ClusterQueryError::Parse`] when the listing held no nodes.
    pub async fn overview(
        &self,
        addresses: &[String],
        password: &str,
    ) -> Result<ClusterOverview, ClusterQueryError> {
        if addresses.is_empty() {
            return Err(ClusterQueryError::NoAddresses);
        }

        let mut fetched = None;
        let mut last_error = None;
        for address in addresses {
            match self.fetch_topology_text(address, password).await {
                Ok(text) => {
                    fetched = Some(text);
                    break;
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Cluster topology fetch failed");
                    last_error = Some(e);
                }
            }
        }
        let (nodes_text, info_text) = match (fetched, last_error) {
            (Some(text), _) => text,
            (None, Some(last)) => {
                return Err(ClusterQueryError::NoReachableAddress {
                    attempts: addresses.len(),
                    last,
                })
            }
            (None, None) => return Err(ClusterQueryError::NoAddresses),
        };

        let nodes = parse_cluster_nodes(&nodes_text)?;
        let state = ClusterState::from_raw(&parse_cluster_state(&info_text));
        let topology = ClusterTopology::new(nodes, state);

        let mut targets = topology.addresses();
        if targets.is_empty() {
            targets = addresses.to_vec();
        }

        let samples = join_all(targets.iter().map(|address| async move {
            match self.sample_node(address, password).await {
                Ok(sample) => Some(sample),
                Err(e) => {
                    warn!(address = %address, error = %e, "Cluster node sample failed");
                    None
                }
            }
        }))
        .await;

        let mut overview = ClusterOverview::from_topology(topology);
        for sample in samples.into_iter().flatten() {
            overview.total_memory_bytes += sample.total_memory;
            overview.used_memory_bytes += sample.used_memory;
            overview.total_connections += sample.connections;
            overview.total_commands_per_sec += sample.ops_per_sec;
            overview.sample_node_counted_for += 1;
        }
        overview.total_memory_human = bytes_to_human(overview.total_memory_bytes);
        overview.used_memory_human = bytes_to_human(overview.used_memory_bytes);

        info!(
            nodes = overview.total_nodes,
            sampled = overview.sample_node_counted_for,
            state = overview.cluster_state.as_str(),
            "Cluster overview computed"
        );
        Ok(overview)
    }
}
