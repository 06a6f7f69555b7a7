//! Parsers for backend-native status text and fetched metadata.
//!
//! Everything here is pure: no I/O, no shared state, safe to call
//! concurrently and repeatedly with identical results.

mod broker;
mod cluster;
mod info;

pub use broker::{
    broker_metrics, consumer_lag, consumer_metrics, monitored_groups, monitored_partitions,
    partition_health, topic_metrics, PartitionHealth,
};
pub use cluster::{normalize_address, parse_cluster_nodes, parse_cluster_state};
pub use info::{parse_info_map, parse_status_text};
