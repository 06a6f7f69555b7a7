//! Raw log-broker metadata as fetched from the cluster.

/// One broker as listed in cluster metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerNode {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMetadata {
    pub id: i32,
    /// `-1` when the partition has no leader.
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub name: String,
    /// Topic-level error reported by the broker, if any.
    pub error: Option<String>,
    pub partitions: Vec<PartitionMetadata>,
}

/// Cluster metadata snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerMetadata {
    pub origin_broker_id: i32,
    pub origin_broker_name: String,
    pub brokers: Vec<BrokerNode>,
    pub topics: Vec<TopicMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupInfo {
    pub group_id: String,
    pub state: String,
    pub members: usize,
}

/// Committed offset and high watermark of one partition for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOffsets {
    pub topic: String,
    pub partition: i32,
    pub committed: i64,
    pub high_watermark: i64,
}
