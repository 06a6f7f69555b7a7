//! Connection registry lifecycle against in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use stackwatch::application::registry::{BrokerRegistry, KeyValueRegistry, RelationalRegistry};
use stackwatch::domain::{ConnectionState, Family, KeyValueMode, OverallStatus};
use stackwatch::error::ConnectionError;
use stackwatch::infrastructure::config::backend::{
    FamilyConfig, KafkaConfig, MySqlConfig, PostgresConfig, RedisConfig,
};
use stackwatch::testkit::backend::{FakeBroker, FakeKeyValue, FakeRelational};
use stackwatch::testkit::config::{kafka_document, redis_document, relational_document};
use stackwatch::testkit::fixtures;

const TIMEOUT: Duration = Duration::from_millis(200);

fn redis(single: Option<&str>, nodes: &[&str]) -> RedisConfig {
    RedisConfig::parse_document(&redis_document(single, nodes)).unwrap()
}

fn postgres(names: &[&str]) -> PostgresConfig {
    PostgresConfig::parse_document(&relational_document(Family::PostgreSql, names)).unwrap()
}

fn mysql(names: &[&str]) -> MySqlConfig {
    MySqlConfig::parse_document(&relational_document(Family::MySql, names)).unwrap()
}

#[tokio::test]
async fn key_value_partial_failure_keeps_reachable_nodes() {
    let kv = FakeKeyValue::new();
    kv.set_down("10.0.0.2:7001");
    let registry = KeyValueRegistry::new(Arc::new(kv.clone()), TIMEOUT);

    registry
        .connect(&redis(Some("127.0.0.1:6379"), &["10.0.0.1:7000", "10.0.0.2:7001"]))
        .await
        .unwrap();

    let status = registry.status();
    assert_eq!(status.status, OverallStatus::Partial);
    assert_eq!(status.instances.len(), 3);
    let failed = status
        .instances
        .iter()
        .find(|i| i.name == "cluster:10.0.0.2:7001")
        .unwrap();
    assert_eq!(failed.state, ConnectionState::Failed);
    assert!(failed.error.as_deref().unwrap().contains("refused"));

    assert!(registry.is_connected(KeyValueMode::Single));
    assert_eq!(registry.targets(KeyValueMode::Single).len(), 1);
    assert_eq!(registry.targets(KeyValueMode::Cluster).len(), 1);
    assert_eq!(registry.configured(KeyValueMode::Cluster), 2);
}

#[tokio::test]
async fn key_value_all_unreachable_is_an_error_but_registry_stays_usable() {
    let kv = FakeKeyValue::new();
    kv.set_down("127.0.0.1:6379");
    let registry = KeyValueRegistry::new(Arc::new(kv.clone()), TIMEOUT);

    let err = registry
        .connect(&redis(Some("127.0.0.1:6379"), &[]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::NoInstanceReachable {
            family: Family::Redis,
            failed: 1
        }
    ));
    assert_eq!(registry.status().status, OverallStatus::Disconnected);

    kv.set_up("127.0.0.1:6379");
    registry.reconnect(&redis(Some("127.0.0.1:6379"), &[])).await.unwrap();
    assert_eq!(registry.status().status, OverallStatus::Connected);
}

#[tokio::test]
async fn key_value_reconnect_releases_previous_handles() {
    let kv = FakeKeyValue::new();
    let registry = KeyValueRegistry::new(Arc::new(kv.clone()), TIMEOUT);

    registry
        .connect(&redis(Some("127.0.0.1:6379"), &["10.0.0.1:7000"]))
        .await
        .unwrap();
    assert_eq!(kv.connects(), 2);

    registry.reconnect(&redis(None, &["10.0.0.9:7000"])).await.unwrap();
    assert_eq!(kv.closes(), 2);
    assert!(!registry.is_connected(KeyValueMode::Single));
    assert_eq!(registry.cluster_addresses(), vec!["10.0.0.9:7000".to_string()]);
    assert_eq!(registry.cluster_password(), "");

    let names: Vec<String> = registry.status().instances.into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["cluster:10.0.0.9:7000".to_string()]);
}

#[tokio::test]
async fn key_value_client_failing_probe_is_closed() {
    let kv = FakeKeyValue::new();
    kv.set_unresponsive("10.0.0.1:7000");
    let registry = KeyValueRegistry::new(Arc::new(kv.clone()), TIMEOUT);

    let err = registry.connect(&redis(None, &["10.0.0.1:7000"])).await;

    assert!(err.is_err());
    assert_eq!(kv.connects(), 1);
    assert_eq!(kv.closes(), 1);
    assert!(!registry.is_connected(KeyValueMode::Cluster));
}

#[tokio::test]
async fn key_value_close_is_idempotent() {
    let kv = FakeKeyValue::new();
    let registry = KeyValueRegistry::new(Arc::new(kv.clone()), TIMEOUT);
    registry.connect(&redis(Some("127.0.0.1:6379"), &[])).await.unwrap();

    registry.close().await;
    registry.close().await;

    assert_eq!(kv.closes(), 1);
    let status = registry.status();
    assert_eq!(status.status, OverallStatus::Disconnected);
    assert_eq!(status.instances[0].state, ConnectionState::Disconnected);
    assert!(registry.targets(KeyValueMode::Single).is_empty());
}

#[tokio::test]
async fn empty_config_connects_nothing() {
    let registry = KeyValueRegistry::new(Arc::new(FakeKeyValue::new()), TIMEOUT);
    registry.connect(&RedisConfig::default()).await.unwrap();
    let status = registry.status();
    assert!(status.instances.is_empty());
    assert_eq!(status.status, OverallStatus::Disconnected);
}

#[tokio::test]
async fn relational_failure_of_one_database_is_isolated() {
    let sql = FakeRelational::new();
    sql.set_down("reports");
    let registry = RelationalRegistry::new(Family::PostgreSql, Arc::new(sql.clone()), TIMEOUT);

    registry
        .connect(&postgres(&["main", "reports"]).databases)
        .await
        .unwrap();

    assert_eq!(registry.status().status, OverallStatus::Partial);
    let targets = registry.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].entry.name, "main");
    assert_eq!(
        registry.connection_info(),
        vec!["main@localhost:5432/main", "reports@localhost:5432/reports"]
    );
}

#[tokio::test]
async fn relational_reconnect_drops_removed_entries() {
    let sql = FakeRelational::new();
    let registry = RelationalRegistry::new(Family::MySql, Arc::new(sql.clone()), TIMEOUT);
    registry
        .connect(&mysql(&["a", "b"]).databases)
        .await
        .unwrap();

    registry.reconnect(&mysql(&["b"]).databases).await.unwrap();

    assert_eq!(sql.closes(), 2);
    assert_eq!(registry.configured(), 1);
    assert_eq!(registry.status().instances[0].name, "b");
}

#[tokio::test]
async fn broker_probe_failure_is_reported() {
    let broker = FakeBroker::new();
    broker.set_down(true);
    let registry = BrokerRegistry::new(Arc::new(broker.clone()), TIMEOUT);
    let config = KafkaConfig::parse_document(&kafka_document("events", &["kafka-1:9092"])).unwrap();

    assert!(registry.connect(&config).await.is_err());
    let status = registry.status();
    assert_eq!(status.instances.len(), 1);
    assert_eq!(status.instances[0].name, "events");
    assert_eq!(status.instances[0].state, ConnectionState::Failed);

    broker.set_down(false);
    registry.reconnect(&config).await.unwrap();
    assert!(registry.is_connected());
    assert_eq!(registry.connection_info(), vec!["kafka-1:9092".to_string()]);
}

#[tokio::test]
async fn broker_admin_failing_probe_is_closed() {
    let broker = FakeBroker::new();
    let mut metadata = fixtures::broker_metadata();
    metadata.brokers.clear();
    broker.set_metadata(metadata);
    let registry = BrokerRegistry::new(Arc::new(broker.clone()), TIMEOUT);
    let config = KafkaConfig::parse_document(&kafka_document("events", &["kafka-1:9092"])).unwrap();

    assert!(registry.connect(&config).await.is_err());
    assert_eq!(broker.connects(), 1);
    assert_eq!(broker.closes(), 1);
}

#[tokio::test]
async fn broker_without_brokers_is_not_an_instance() {
    let registry = BrokerRegistry::new(Arc::new(FakeBroker::new()), TIMEOUT);
    registry.connect(&KafkaConfig::default()).await.unwrap();
    assert_eq!(registry.configured(), 0);
    assert!(registry.targets().is_empty());
}
