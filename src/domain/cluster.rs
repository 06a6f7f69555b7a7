//! Key-value cluster topology and the on-demand overview built from it.

use serde::{Deserialize, Serialize};

/// Number of hash slots in a key-value cluster.
pub const TOTAL_SLOTS: u32 = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Master,
    Slave,
}

/// One parsed `CLUSTER NODES` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    /// `host:port` with any `@bus-port` suffix removed.
    pub address: String,
    pub role: NodeRole,
    /// Slots owned outright; migrating/importing slots are not counted.
    pub assigned_slot_count: u32,
    pub flags: Vec<String>,
}

impl NodeRecord {
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.role == NodeRole::Master
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    Ok,
    Fail,
    #[default]
    Unknown,
}

impl ClusterState {
    /// Map a raw `cluster_state` value; empty or unrecognized text is `Unknown`.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "ok" => ClusterState::Ok,
            "fail" => ClusterState::Fail,
            _ => ClusterState::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ClusterState::Ok => "ok",
            ClusterState::Fail => "fail",
            ClusterState::Unknown => "unknown",
        }
    }
}

/// Node set plus cluster state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    pub nodes: Vec<NodeRecord>,
    pub state: ClusterState,
}

impl ClusterTopology {
    #[must_use]
    pub fn new(nodes: Vec<NodeRecord>, state: ClusterState) -> Self {
        Self { nodes, state }
    }

    #[must_use]
    pub fn master_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_master()).count()
    }

    #[must_use]
    pub fn slave_count(&self) -> usize {
        self.nodes.len() - self.master_count()
    }

    /// Slots owned by master nodes. At most [`TOTAL_SLOTS`] on a sane cluster.
    #[must_use]
    pub fn assigned_slots(&self) -> u32 {
        self.nodes
            .iter()
            .filter(|n| n.is_master())
            .map(|n| n.assigned_slot_count)
            .fold(0, u32::saturating_add)
    }

    /// True when some slots have no owner.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.assigned_slots() < TOTAL_SLOTS
    }

    /// Node addresses in listing order, skipping records without one.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| !n.address.is_empty() && !n.address.starts_with(':'))
            .map(|n| n.address.clone())
            .collect()
    }
}

/// Topology plus resource totals summed over every node that answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOverview {
    pub total_nodes: usize,
    pub master_nodes: usize,
    pub slave_nodes: usize,
    pub total_slots: u32,
    pub assigned_slots: u32,
    pub cluster_state: ClusterState,
    pub total_memory_bytes: i64,
    pub used_memory_bytes: i64,
    #[serde(rename = "total_memory")]
    pub total_memory_human: String,
    #[serde(rename = "used_memory")]
    pub used_memory_human: String,
    pub total_connections: i64,
    pub total_commands_per_sec: i64,
    /// Nodes whose resource figures are included in the totals.
    pub sample_node_counted_for: usize,
    pub nodes: Vec<NodeRecord>,
}

impl ClusterOverview {
    /// Overview with topology counts filled and resource totals at zero.
    #[must_use]
    pub fn from_topology(topology: ClusterTopology) -> Self {
        Self {
            total_nodes: topology.nodes.len(),
            master_nodes: topology.master_count(),
            slave_nodes: topology.slave_count(),
            total_slots: TOTAL_SLOTS,
            assigned_slots: topology.assigned_slots(),
            cluster_state: topology.state,
            nodes: topology.nodes,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, role: NodeRole, slots: u32) -> NodeRecord {
        NodeRecord {
            id: id.into(),
            address: format!("10.0.0.1:{}", 7000 + slots % 7),
            role,
            assigned_slot_count: slots,
            flags: Vec::new(),
        }
    }

    #[test]
    fn cluster_state_from_raw() {
        assert_eq!(ClusterState::from_raw("ok"), ClusterState::Ok);
        assert_eq!(ClusterState::from_raw(" fail "), ClusterState::Fail);
        assert_eq!(ClusterState::from_raw(""), ClusterState::Unknown);
    }

    #[test]
    fn topology_counts_only_master_slots() {
        let topology = ClusterTopology::new(
            vec![
                node("a", NodeRole::Master, 8192),
                node("b", NodeRole::Master, 8000),
                node("c", NodeRole::Slave, 0),
            ],
            ClusterState::Ok,
        );
        assert_eq!(topology.master_count(), 2);
        assert_eq!(topology.slave_count(), 1);
        assert_eq!(topology.assigned_slots(), 16192);
        assert!(topology.is_degraded());
    }

    #[test]
    fn assigned_slots_saturate_instead_of_overflowing() {
        let topology = ClusterTopology::new(
            vec![
                node("a", NodeRole::Master, u32::MAX),
                node("b", NodeRole::Master, 10),
            ],
            ClusterState::Fail,
        );
        assert_eq!(topology.assigned_slots(), u32::MAX);
        assert!(!topology.is_degraded());
    }

    #[test]
    fn overview_from_topology() {
        let topology = ClusterTopology::new(
            vec![node("a", NodeRole::Master, TOTAL_SLOTS)],
            ClusterState::Unknown,
        );
        let overview = ClusterOverview::from_topology(topology);
        assert_eq!(overview.total_nodes, 1);
        assert_eq!(overview.assigned_slots, TOTAL_SLOTS);
        assert_eq!(overview.total_slots, TOTAL_SLOTS);
        assert_eq!(overview.sample_node_counted_for, 0);
        assert_eq!(overview.cluster_state, ClusterState::Unknown);
    }
}
