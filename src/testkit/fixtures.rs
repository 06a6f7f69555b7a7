//! Canned backend replies shared by the fakes and by tests that assert on
//! what the fakes return.

use crate::domain::{
    BrokerMetadata, BrokerNode, ConsumerGroupInfo, PartitionMetadata, PartitionOffsets,
    TopicMetadata,
};
use crate::port::RelationalStats;

/// Full `INFO` reply of a healthy master. Also used for every section query.
pub const INFO: &str = "# Server\r\n\
redis_version:7.2.4\r\n\
uptime_in_seconds:7200\r\n\
\r\n\
# Clients\r\n\
connected_clients:3\r\n\
blocked_clients:0\r\n\
\r\n\
# Memory\r\n\
used_memory:1048576\r\n\
used_memory_human:1.00M\r\n\
maxmemory:4194304\r\n\
total_system_memory:8589934592\r\n\
mem_fragmentation_ratio:1.20\r\n\
\r\n\
# Persistence\r\n\
loading:0\r\n\
aof_enabled:0\r\n\
\r\n\
# Stats\r\n\
total_commands_processed:5000\r\n\
instantaneous_ops_per_sec:12\r\n\
keyspace_hits:90\r\n\
keyspace_misses:10\r\n\
\r\n\
# Replication\r\n\
role:master\r\n\
connected_slaves:1\r\n\
\r\n\
# Keyspace\r\n\
db0:keys=10,expires=2,avg_ttl=0\r\n";

/// `INFO` reply of a node still loading its dataset.
pub const INFO_LOADING: &str = "role:master\r\nloading:1\r\nconnected_clients:1\r\n";

/// Three masters covering every slot plus one replica.
pub const CLUSTER_NODES: &str = "\
a1 10.0.0.1:7000@17000 myself,master - 0 0 1 connected 0-5460
b2 10.0.0.2:7001@17001 master - 0 1700000000000 2 connected 5461-10922
c3 10.0.0.3:7002@17002 master - 0 1700000000000 3 connected 10923-16383
d4 10.0.0.4:7003@17003 slave a1 0 1700000000000 1 connected
";

/// Every node address in [`CLUSTER_NODES`].
pub const CLUSTER_ADDRESSES: [&str; 4] = [
    "10.0.0.1:7000",
    "10.0.0.2:7001",
    "10.0.0.3:7002",
    "10.0.0.4:7003",
];

pub const CLUSTER_INFO: &str = "cluster_state:ok\r\n\
cluster_slots_assigned:16384\r\n\
cluster_known_nodes:4\r\n\
cluster_size:3\r\n";

/// One broker, an `orders` topic with two partitions and the internal
/// offsets topic.
pub fn broker_metadata() -> BrokerMetadata {
    let partition = |id| PartitionMetadata {
        id,
        leader: 1,
        replicas: vec![1],
        isr: vec![1],
    };
    BrokerMetadata {
        origin_broker_id: 1,
        origin_broker_name: "kafka-1:9092/1".into(),
        brokers: vec![BrokerNode {
            id: 1,
            host: "kafka-1".into(),
            port: 9092,
        }],
        topics: vec![
            TopicMetadata {
                name: "orders".into(),
                error: None,
                partitions: vec![partition(0), partition(1)],
            },
            TopicMetadata {
                name: "__consumer_offsets".into(),
                error: None,
                partitions: vec![partition(0)],
            },
        ],
    }
}

pub fn group(id: &str) -> ConsumerGroupInfo {
    ConsumerGroupInfo {
        group_id: id.into(),
        state: "Stable".into(),
        members: 1,
    }
}

/// Committed offsets on `orders` with a total lag of 15.
pub fn offsets() -> Vec<PartitionOffsets> {
    vec![
        PartitionOffsets {
            topic: "orders".into(),
            partition: 0,
            committed: 90,
            high_watermark: 100,
        },
        PartitionOffsets {
            topic: "orders".into(),
            partition: 1,
            committed: 45,
            high_watermark: 50,
        },
    ]
}

pub fn relational_stats() -> RelationalStats {
    RelationalStats {
        version: "16.2".into(),
        size_bytes: 10 * 1024 * 1024,
        table_count: 12,
        uptime_seconds: 3600,
        connections: 5,
        threads_running: 1,
        max_connections: 100,
    }
}
