//! Metrics aggregation across every connected instance.
//!
//! One poll per connected instance runs concurrently, each under the request
//! deadline. A poll that fails or times out is logged and omitted; the
//! snapshot reports it as offline in the summary instead of failing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::deadline::with_deadline;
use super::registry::{BrokerTarget, KeyValueTarget, Registries, RelationalTarget};
use crate::domain::{
    bytes_to_human, Family, KafkaConsumerMetrics, KafkaMetrics, KeyValueMode, MetricsSnapshot,
    MySqlMetrics, PostgresMetrics, RedisMetrics, ServiceStatus,
};
use crate::error::BackendError;
use crate::port::{RelationalStats, SnapshotSource};
use crate::protocol::{
    broker_metrics, consumer_metrics, monitored_groups, monitored_partitions, parse_status_text,
};

/// What one poll produced.
enum Sample {
    Redis(RedisMetrics),
    Kafka(Vec<KafkaMetrics>),
    Postgres(PostgresMetrics),
    MySql(MySqlMetrics),
}

type PollResult = (Family, String, Result<Sample, BackendError>);

pub struct MetricsAggregator {
    registries: Registries,
    request_timeout: Duration,
}

impl MetricsAggregator {
    /// `request_timeout` bounds every individual backend call.
    #[must_use]
    pub fn new(registries: Registries, request_timeout: Duration) -> Self {
        Self {
            registries,
            request_timeout,
        }
    }

    /// Poll every connected instance of every family into one snapshot.
    ///
    /// Never fails: instances that are not connected or whose poll failed
    /// are counted offline in the summary.
    pub async fn get_all_metrics(&self) -> MetricsSnapshot {
        let timeout = self.request_timeout;
        let mut tasks: JoinSet<PollResult> = JoinSet::new();
        let mut missing = 0;

        for mode in KeyValueMode::ALL {
            let targets = self.registries.key_value.targets(mode);
            missing += self
                .registries
                .key_value
                .configured(mode)
                .saturating_sub(targets.len());
            for target in targets {
                tasks.spawn(async move {
                    let name = target.name.clone();
                    (Family::Redis, name, poll_key_value(target, timeout).await)
                });
            }
        }

        let brokers = self.registries.broker.targets();
        missing += self.registries.broker.configured().saturating_sub(brokers.len());
        for target in brokers {
            tasks.spawn(async move {
                let name = target.name.clone();
                (Family::Kafka, name, poll_broker(target, timeout).await)
            });
        }

        for registry in [&self.registries.postgres, &self.registries.mysql] {
            let family = registry.family();
            let targets = registry.targets();
            missing += registry.configured().saturating_sub(targets.len());
            for target in targets {
                tasks.spawn(async move {
                    let name = target.entry.name.clone();
                    (family, name, poll_relational(family, target, timeout).await)
                });
            }
        }

        let mut snapshot = MetricsSnapshot::empty();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(sample))) => match sample {
                    Sample::Redis(record) => snapshot.redis.push(record),
                    Sample::Kafka(records) => snapshot.kafka.extend(records),
                    Sample::Postgres(record) => snapshot.postgresql.push(record),
                    Sample::MySql(record) => snapshot.mysql.push(record),
                },
                Ok((family, instance, Err(e))) => {
                    warn!(family = %family, instance = %instance, error = %e, "Metrics poll failed");
                    missing += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Metrics poll task aborted");
                    missing += 1;
                }
            }
        }

        // Completion order is arbitrary; keep records stable for consumers.
        snapshot.redis.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
            .kafka
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.broker_id.cmp(&b.broker_id)));
        snapshot.postgresql.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.mysql.sort_by(|a, b| a.name.cmp(&b.name));

        snapshot.summarize(missing);
        snapshot.timestamp = Utc::now();
        debug!(
            records = snapshot.record_count(),
            missing,
            health = snapshot.summary.health_percentage,
            "Snapshot assembled"
        );
        snapshot
    }
}

#[async_trait]
impl SnapshotSource for MetricsAggregator {
    async fn snapshot(&self) -> MetricsSnapshot {
        self.get_all_metrics().await
    }
}

async fn poll_key_value(target: KeyValueTarget, timeout: Duration) -> Result<Sample, BackendError> {
    let text = with_deadline(Family::Redis, timeout, target.client.info(None)).await?;
    let info = parse_status_text(&text);
    let status = if info.loading {
        ServiceStatus::Warning
    } else {
        ServiceStatus::Online
    };
    Ok(Sample::Redis(RedisMetrics {
        name: target.name,
        mode: target.mode,
        host: target.endpoint.host,
        port: target.endpoint.port,
        status,
        info,
        timestamp: Utc::now(),
    }))
}

async fn poll_broker(target: BrokerTarget, timeout: Duration) -> Result<Sample, BackendError> {
    let admin = &target.admin;
    let monitoring = &target.config.monitoring;
    let metadata = with_deadline(Family::Kafka, timeout, admin.metadata()).await?;

    let groups = match with_deadline(Family::Kafka, timeout, admin.consumer_groups()).await {
        Ok(groups) => monitored_groups(groups, &monitoring.consumer_groups),
        Err(e) => {
            warn!(instance = %target.name, error = %e, "Consumer group listing failed");
            Vec::new()
        }
    };

    let partitions = monitored_partitions(&metadata, &monitoring.topics);
    let mut consumers: Vec<KafkaConsumerMetrics> = Vec::with_capacity(groups.len());
    for group in groups {
        let offsets = match with_deadline(
            Family::Kafka,
            timeout,
            admin.committed_offsets(&group.group_id, &partitions),
        )
        .await
        {
            Ok(offsets) => offsets,
            Err(e) => {
                warn!(
                    instance = %target.name,
                    group = %group.group_id,
                    error = %e,
                    "Committed offset lookup failed"
                );
                Vec::new()
            }
        };
        consumers.push(consumer_metrics(group, &offsets));
    }

    Ok(Sample::Kafka(broker_metrics(
        &target.name,
        &metadata,
        &monitoring.topics,
        &consumers,
    )))
}

async fn poll_relational(
    family: Family,
    target: RelationalTarget,
    timeout: Duration,
) -> Result<Sample, BackendError> {
    with_deadline(family, timeout, target.client.ping()).await?;
    let stats = with_deadline(family, timeout, async { Ok(target.client.collect().await) }).await?;
    let entry = target.entry;
    let timestamp = Utc::now();
    let connection_percent = stats.connection_percent();
    let RelationalStats {
        version,
        size_bytes,
        table_count,
        uptime_seconds,
        connections,
        threads_running,
        max_connections,
    } = stats;

    let sample = match family {
        Family::MySql => Sample::MySql(MySqlMetrics {
            name: entry.name,
            host: entry.host,
            port: entry.port,
            status: ServiceStatus::Online,
            version,
            database_size: size_bytes,
            database_size_human: bytes_to_human(size_bytes),
            table_count,
            uptime_seconds,
            threads_connected: connections,
            threads_running,
            max_connections,
            connection_percent,
            timestamp,
        }),
        _ => Sample::Postgres(PostgresMetrics {
            name: entry.name,
            host: entry.host,
            port: entry.port,
            status: ServiceStatus::Online,
            version,
            database_size: size_bytes,
            database_size_human: bytes_to_human(size_bytes),
            table_count,
            uptime_seconds,
            active_connections: connections,
            max_connections,
            connection_percent,
            timestamp,
        }),
    };
    Ok(sample)
}
