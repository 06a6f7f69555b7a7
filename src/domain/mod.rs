//! Backend-agnostic domain types: families, connection states, metric
//! records, snapshots and cluster topology.

mod alert;
mod broker;
mod cluster;
mod connection;
mod family;
mod format;
mod metrics;

pub use alert::{Alert, AlertLevel, AlertType};
pub use broker::{
    BrokerMetadata, BrokerNode, ConsumerGroupInfo, PartitionMetadata, PartitionOffsets,
    TopicMetadata,
};
pub use cluster::{
    ClusterOverview, ClusterState, ClusterTopology, NodeRecord, NodeRole, TOTAL_SLOTS,
};
pub use connection::{ConnectionState, FamilyStatus, InstanceStatus, OverallStatus};
pub use family::{Family, KeyValueMode};
pub use format::{bytes_to_human, format_uptime};
pub use metrics::{
    KafkaConsumerMetrics, KafkaMetrics, KafkaTopicLag, KafkaTopicMetrics, KeyspaceStats,
    MetricsSnapshot, MetricsSummary, MySqlMetrics, PostgresMetrics, RedisInfo, RedisMetrics,
    ServiceStatus,
};
