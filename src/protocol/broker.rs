//! Derivations over fetched log-broker metadata.

use chrono::Utc;

use crate::domain::{
    BrokerMetadata, ConsumerGroupInfo, KafkaConsumerMetrics, KafkaMetrics, KafkaTopicLag,
    KafkaTopicMetrics, PartitionOffsets, ServiceStatus,
};

/// Partition problems counted across every topic in the metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionHealth {
    /// Partitions with fewer in-sync replicas than replicas.
    pub under_replicated: usize,
    /// Partitions without a leader.
    pub offline: usize,
}

fn allowed(name: &str, allow: &[String]) -> bool {
    allow.is_empty() || allow.iter().any(|a| a == name)
}

/// Metrics for the monitored topics and their total partition count.
///
/// Internal `__` topics and topics reporting an error are skipped; an empty
/// allow-list monitors every other topic. Replication factor and ISR count
/// come from the first partition.
#[must_use]
pub fn topic_metrics(metadata: &BrokerMetadata, allow: &[String]) -> (Vec<KafkaTopicMetrics>, usize) {
    let mut total_partitions = 0;
    let topics = metadata
        .topics
        .iter()
        .filter(|t| !t.name.starts_with("__") && allowed(&t.name, allow))
        .filter(|t| t.error.is_none())
        .map(|t| {
            total_partitions += t.partitions.len();
            let first = t.partitions.first();
            KafkaTopicMetrics {
                name: t.name.clone(),
                partitions: t.partitions.len(),
                replication_factor: first.map_or(0, |p| p.replicas.len()),
                isr_count: first.map_or(0, |p| p.isr.len()),
            }
        })
        .collect();
    (topics, total_partitions)
}

/// `(topic, partition)` pairs of the monitored topics, for offset lookups.
#[must_use]
pub fn monitored_partitions(metadata: &BrokerMetadata, allow: &[String]) -> Vec<(String, i32)> {
    metadata
        .topics
        .iter()
        .filter(|t| !t.name.starts_with("__") && allowed(&t.name, allow))
        .filter(|t| t.error.is_none())
        .flat_map(|t| t.partitions.iter().map(|p| (t.name.clone(), p.id)))
        .collect()
}

#[must_use]
pub fn partition_health(metadata: &BrokerMetadata) -> PartitionHealth {
    let mut health = PartitionHealth::default();
    for partition in metadata.topics.iter().flat_map(|t| &t.partitions) {
        if partition.replicas.len() > partition.isr.len() {
            health.under_replicated += 1;
        }
        if partition.leader == -1 {
            health.offline += 1;
        }
    }
    health
}

/// Groups on the allow-list; an empty list keeps every group.
#[must_use]
pub fn monitored_groups(groups: Vec<ConsumerGroupInfo>, allow: &[String]) -> Vec<ConsumerGroupInfo> {
    groups
        .into_iter()
        .filter(|g| allowed(&g.group_id, allow))
        .collect()
}

/// Per-partition lag (`high watermark - committed`, never negative) and the total.
#[must_use]
pub fn consumer_lag(offsets: &[PartitionOffsets]) -> (Vec<KafkaTopicLag>, i64) {
    let lags: Vec<KafkaTopicLag> = offsets
        .iter()
        .map(|o| KafkaTopicLag {
            topic: o.topic.clone(),
            partition: o.partition,
            current_offset: o.committed,
            log_end_offset: o.high_watermark,
            lag: (o.high_watermark - o.committed).max(0),
        })
        .collect();
    let total = lags.iter().map(|l| l.lag).sum();
    (lags, total)
}

/// Combine a group description with its lag figures.
#[must_use]
pub fn consumer_metrics(group: ConsumerGroupInfo, offsets: &[PartitionOffsets]) -> KafkaConsumerMetrics {
    let (topic_lags, lag) = consumer_lag(offsets);
    KafkaConsumerMetrics {
        group_id: group.group_id,
        state: group.state,
        members: group.members,
        lag,
        topic_lags,
    }
}

/// One record per broker in the metadata.
///
/// Every record carries the same cluster-wide topic and partition figures;
/// a record is `warning` when any partition is offline or under-replicated.
#[must_use]
pub fn broker_metrics(
    instance: &str,
    metadata: &BrokerMetadata,
    topic_allow: &[String],
    consumer_groups: &[KafkaConsumerMetrics],
) -> Vec<KafkaMetrics> {
    let (topics, total_partitions) = topic_metrics(metadata, topic_allow);
    let health = partition_health(metadata);
    let status = if health.offline > 0 || health.under_replicated > 0 {
        ServiceStatus::Warning
    } else {
        ServiceStatus::Online
    };
    let timestamp = Utc::now();

    metadata
        .brokers
        .iter()
        .map(|broker| KafkaMetrics {
            name: instance.to_string(),
            broker_id: broker.id,
            host: broker.host.clone(),
            port: broker.port,
            status,
            cluster_id: metadata.origin_broker_name.clone(),
            is_origin: broker.id == metadata.origin_broker_id,
            total_topics: topics.len(),
            topics: topics.clone(),
            consumer_groups: consumer_groups.to_vec(),
            total_partitions,
            under_replicated_partitions: health.under_replicated,
            offline_partitions: health.offline,
            timestamp,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BrokerNode, PartitionMetadata, TopicMetadata};

    fn partition(id: i32, leader: i32, replicas: usize, isr: usize) -> PartitionMetadata {
        PartitionMetadata {
            id,
            leader,
            replicas: (1..=replicas as i32).collect(),
            isr: (1..=isr as i32).collect(),
        }
    }

    fn topic(name: &str, partitions: Vec<PartitionMetadata>) -> TopicMetadata {
        TopicMetadata {
            name: name.into(),
            error: None,
            partitions,
        }
    }

    fn metadata() -> BrokerMetadata {
        BrokerMetadata {
            origin_broker_id: 1,
            origin_broker_name: "kafka-1:9092/1".into(),
            brokers: vec![
                BrokerNode {
                    id: 1,
                    host: "kafka-1".into(),
                    port: 9092,
                },
                BrokerNode {
                    id: 2,
                    host: "kafka-2".into(),
                    port: 9092,
                },
            ],
            topics: vec![
                topic("orders", vec![partition(0, 1, 3, 3), partition(1, 2, 3, 2)]),
                topic("payments", vec![partition(0, -1, 2, 0)]),
                topic("__consumer_offsets", vec![partition(0, 1, 3, 3)]),
                TopicMetadata {
                    name: "broken".into(),
                    error: Some("UnknownTopicOrPartition".into()),
                    partitions: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn topics_skip_internal_and_errored() {
        let (topics, total) = topic_metrics(&metadata(), &[]);
        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "payments"]);
        assert_eq!(total, 3);
        assert_eq!(topics[0].replication_factor, 3);
        assert_eq!(topics[0].isr_count, 3);
    }

    #[test]
    fn topics_respect_allow_list() {
        let (topics, total) = topic_metrics(&metadata(), &["payments".to_string()]);
        assert_eq!(topics.len(), 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn counts_under_replicated_and_offline() {
        let health = partition_health(&metadata());
        assert_eq!(health.under_replicated, 2);
        assert_eq!(health.offline, 1);
    }

    #[test]
    fn monitored_partitions_follow_topic_filter() {
        let pairs = monitored_partitions(&metadata(), &[]);
        assert_eq!(
            pairs,
            vec![
                ("orders".to_string(), 0),
                ("orders".to_string(), 1),
                ("payments".to_string(), 0)
            ]
        );
    }

    #[test]
    fn lag_is_never_negative() {
        let offsets = vec![
            PartitionOffsets {
                topic: "orders".into(),
                partition: 0,
                committed: 90,
                high_watermark: 100,
            },
            PartitionOffsets {
                topic: "orders".into(),
                partition: 1,
                committed: 120,
                high_watermark: 100,
            },
        ];
        let (lags, total) = consumer_lag(&offsets);
        assert_eq!(lags[0].lag, 10);
        assert_eq!(lags[1].lag, 0);
        assert_eq!(total, 10);
    }

    #[test]
    fn group_allow_list() {
        let groups = vec![
            ConsumerGroupInfo {
                group_id: "billing".into(),
                state: "Stable".into(),
                members: 2,
            },
            ConsumerGroupInfo {
                group_id: "audit".into(),
                state: "Empty".into(),
                members: 0,
            },
        ];
        assert_eq!(monitored_groups(groups.clone(), &[]).len(), 2);
        let kept = monitored_groups(groups, &["audit".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].group_id, "audit");
    }

    #[test]
    fn one_record_per_broker_with_warning_status() {
        let records = broker_metrics("default", &metadata(), &[], &[]);
        assert_eq!(records.len(), 2);
        assert!(records[0].is_origin);
        assert!(!records[1].is_origin);
        assert_eq!(records[1].status, ServiceStatus::Warning);
        assert_eq!(records[0].total_topics, 2);
        assert_eq!(records[0].offline_partitions, 1);
    }

    #[test]
    fn healthy_cluster_is_online() {
        let mut md = metadata();
        md.topics.truncate(1);
        md.topics[0].partitions.truncate(1);
        let records = broker_metrics("default", &md, &[], &[]);
        assert!(records.iter().all(|r| r.status == ServiceStatus::Online));
    }
}
