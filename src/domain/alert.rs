//! Alert data shape. No threshold evaluation happens in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Family;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Memory,
    Cpu,
    Connections,
    Disk,
    Replication,
    SlowQuery,
    ConsumerLag,
    Partition,
    CacheHitRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: AlertLevel,
    pub service: Family,
    pub instance: String,
    pub message: String,
    pub value: serde_json::Value,
    pub threshold: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let alert = Alert {
            id: "a-1".into(),
            kind: AlertType::ConsumerLag,
            severity: AlertLevel::Warning,
            service: Family::Kafka,
            instance: "kafka-1:9092".into(),
            message: "lag above threshold".into(),
            value: serde_json::json!(1200),
            threshold: serde_json::json!(1000),
            timestamp: Utc::now(),
            acknowledged: false,
            resolved_at: None,
        };
        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["type"], "consumer_lag");
        assert_eq!(value["severity"], "warning");
        assert!(value.get("resolved_at").is_none());
    }
}
