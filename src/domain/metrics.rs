//! Metric records produced by one aggregation cycle.
//!
//! Every record is serialized wholesale to observers; field names are part of
//! the push payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::KeyValueMode;

/// Per-record health classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Online,
    Offline,
    Warning,
}

/// One `dbN:keys=..,expires=..,avg_ttl=..` keyspace entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceStats {
    pub keys: i64,
    pub expires: i64,
    pub avg_ttl: i64,
}

/// Fields extracted from key-value status text.
///
/// Unknown keys are ignored and malformed numbers stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedisInfo {
    pub role: String,
    pub connected_clients: i64,
    pub blocked_clients: i64,
    pub used_memory: i64,
    pub used_memory_human: String,
    pub used_memory_rss: i64,
    pub used_memory_peak: i64,
    pub used_memory_peak_human: String,
    pub max_memory: i64,
    pub memory_usage_percent: f64,
    pub fragmentation_ratio: f64,
    pub cpu_usage: f64,
    pub cpu_usage_sys: f64,
    pub total_commands: i64,
    pub instantaneous_ops_per_sec: i64,
    pub keyspace_hits: i64,
    pub keyspace_misses: i64,
    pub hit_rate: f64,
    pub evicted_keys: i64,
    pub expired_keys: i64,
    pub net_input_bytes: i64,
    pub net_output_bytes: i64,
    pub rejected_connections: i64,
    pub uptime: i64,
    pub uptime_human: String,
    pub connected_slaves: i64,
    pub master_repl_offset: i64,
    pub replica_offset: i64,
    pub loading: bool,
    pub rdb_last_save_time: i64,
    pub rdb_changes_since_last_save: i64,
    pub aof_enabled: bool,
    pub keyspace: BTreeMap<String, KeyspaceStats>,
    pub total_keys: i64,
    pub database_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisMetrics {
    pub name: String,
    pub mode: KeyValueMode,
    pub host: String,
    pub port: u16,
    pub status: ServiceStatus,
    #[serde(flatten)]
    pub info: RedisInfo,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaTopicMetrics {
    pub name: String,
    pub partitions: usize,
    pub replication_factor: usize,
    pub isr_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaTopicLag {
    pub topic: String,
    pub partition: i32,
    pub current_offset: i64,
    pub log_end_offset: i64,
    pub lag: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaConsumerMetrics {
    pub group_id: String,
    pub state: String,
    pub members: usize,
    pub lag: i64,
    pub topic_lags: Vec<KafkaTopicLag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaMetrics {
    /// Configured instance name the record was polled through.
    pub name: String,
    pub broker_id: i32,
    pub host: String,
    pub port: i32,
    pub status: ServiceStatus,
    /// Broker that answered the metadata request.
    pub cluster_id: String,
    /// True when this broker answered the metadata request itself.
    pub is_origin: bool,
    pub topics: Vec<KafkaTopicMetrics>,
    pub consumer_groups: Vec<KafkaConsumerMetrics>,
    pub total_partitions: usize,
    pub total_topics: usize,
    pub under_replicated_partitions: usize,
    pub offline_partitions: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresMetrics {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub status: ServiceStatus,
    pub version: String,
    pub database_size: i64,
    pub database_size_human: String,
    pub table_count: i64,
    pub uptime_seconds: i64,
    pub active_connections: i64,
    pub max_connections: i64,
    pub connection_percent: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlMetrics {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub status: ServiceStatus,
    pub version: String,
    pub database_size: i64,
    pub database_size_human: String,
    pub table_count: i64,
    pub uptime_seconds: i64,
    pub threads_connected: i64,
    pub threads_running: i64,
    pub max_connections: i64,
    pub connection_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// Fleet-wide counts attached to every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_services: usize,
    pub online_services: usize,
    pub offline_services: usize,
    pub warning_services: usize,
    pub health_percentage: f64,
    pub total_connections: i64,
    pub total_databases: usize,
    pub total_memory_used: i64,
    pub total_disk_used: i64,
}

/// One point-in-time aggregation result. Built fresh every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub redis: Vec<RedisMetrics>,
    pub kafka: Vec<KafkaMetrics>,
    pub postgresql: Vec<PostgresMetrics>,
    pub mysql: Vec<MySqlMetrics>,
    pub summary: MetricsSummary,
    pub timestamp: DateTime<Utc>,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            redis: Vec::new(),
            kafka: Vec::new(),
            postgresql: Vec::new(),
            mysql: Vec::new(),
            summary: MetricsSummary::default(),
            timestamp: Utc::now(),
        }
    }

    /// Number of metric records across all families.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.redis.len() + self.kafka.len() + self.postgresql.len() + self.mysql.len()
    }

    fn statuses(&self) -> impl Iterator<Item = ServiceStatus> + '_ {
        self.redis
            .iter()
            .map(|r| r.status)
            .chain(self.kafka.iter().map(|k| k.status))
            .chain(self.postgresql.iter().map(|p| p.status))
            .chain(self.mysql.iter().map(|m| m.status))
    }

    /// Recompute the summary block from the records.
    ///
    /// `missing` counts instances that were expected but produced no record
    /// (not connected, or their poll failed); they are reported offline.
    pub fn summarize(&mut self, missing: usize) {
        let mut summary = MetricsSummary::default();
        for status in self.statuses() {
            match status {
                ServiceStatus::Online => summary.online_services += 1,
                ServiceStatus::Warning => summary.warning_services += 1,
                ServiceStatus::Offline => summary.offline_services += 1,
            }
        }
        summary.offline_services += missing;
        summary.total_services =
            summary.online_services + summary.warning_services + summary.offline_services;
        if summary.total_services > 0 {
            summary.health_percentage =
                summary.online_services as f64 / summary.total_services as f64 * 100.0;
        }

        summary.total_connections = self
            .redis
            .iter()
            .map(|r| r.info.connected_clients)
            .chain(self.postgresql.iter().map(|p| p.active_connections))
            .chain(self.mysql.iter().map(|m| m.threads_connected))
            .sum();
        summary.total_databases = self.postgresql.len() + self.mysql.len();
        summary.total_memory_used = self.redis.iter().map(|r| r.info.used_memory).sum();
        summary.total_disk_used = self
            .postgresql
            .iter()
            .map(|p| p.database_size)
            .chain(self.mysql.iter().map(|m| m.database_size))
            .sum();

        self.summary = summary;
    }
}
