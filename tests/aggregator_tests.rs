//! Snapshot aggregation across all four families.

use std::path::Path;
use std::time::Duration;

use stackwatch::domain::{Family, ServiceStatus};
use stackwatch::testkit::config::{
    context, kafka_document, redis_document, relational_document, write_document,
};
use stackwatch::testkit::fixtures;

fn write_fleet(dir: &Path) {
    write_document(dir, Family::Redis, &redis_document(Some("127.0.0.1:6379"), &[])).unwrap();
    write_document(dir, Family::Kafka, &kafka_document("events", &["kafka-1:9092"])).unwrap();
    write_document(
        dir,
        Family::PostgreSql,
        &relational_document(Family::PostgreSql, &["main"]),
    )
    .unwrap();
    write_document(dir, Family::MySql, &relational_document(Family::MySql, &["shop"])).unwrap();
}

#[tokio::test]
async fn snapshot_covers_every_connected_family() {
    let dir = tempfile::tempdir().unwrap();
    write_fleet(dir.path());
    let (ctx, _fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;

    let snapshot = ctx.aggregator.get_all_metrics().await;

    assert_eq!(snapshot.redis.len(), 1);
    let redis = &snapshot.redis[0];
    assert_eq!(redis.name, "single:127.0.0.1:6379");
    assert_eq!(redis.status, ServiceStatus::Online);
    assert_eq!(redis.info.used_memory, 1_048_576);
    assert_eq!(redis.info.total_keys, 10);

    assert_eq!(snapshot.kafka.len(), 1);
    let kafka = &snapshot.kafka[0];
    assert_eq!(kafka.name, "events");
    assert_eq!(kafka.total_topics, 1);
    assert_eq!(kafka.total_partitions, 2);
    assert_eq!(kafka.consumer_groups.len(), 1);
    assert_eq!(kafka.consumer_groups[0].lag, 15);

    assert_eq!(snapshot.postgresql[0].table_count, 12);
    assert_eq!(snapshot.postgresql[0].database_size_human, "10.0M");
    assert_eq!(snapshot.mysql[0].threads_running, 1);
    assert!((snapshot.mysql[0].connection_percent - 5.0).abs() < 1e-9);

    let summary = &snapshot.summary;
    assert_eq!(summary.total_services, 4);
    assert_eq!(summary.online_services, 4);
    assert!((summary.health_percentage - 100.0).abs() < f64::EPSILON);
    assert_eq!(summary.total_connections, 3 + 5 + 5);
    assert_eq!(summary.total_databases, 2);
    assert_eq!(summary.total_memory_used, 1_048_576);
    assert_eq!(summary.total_disk_used, 2 * fixtures::relational_stats().size_bytes);
}

#[tokio::test(start_paused = true)]
async fn slow_instance_is_dropped_at_the_deadline() {
    let dir = tempfile::tempdir().unwrap();
    write_fleet(dir.path());
    let (ctx, fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;
    fakes.postgres.set_collect_delay(Duration::from_secs(30));

    let started = tokio::time::Instant::now();
    let snapshot = ctx.aggregator.get_all_metrics().await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(snapshot.postgresql.is_empty());
    assert_eq!(snapshot.mysql.len(), 1);
    assert_eq!(snapshot.summary.total_services, 4);
    assert_eq!(snapshot.summary.offline_services, 1);
    assert!((snapshot.summary.health_percentage - 75.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn unreachable_instance_counts_offline() {
    let dir = tempfile::tempdir().unwrap();
    write_fleet(dir.path());
    let (ctx, fakes) = context(dir.path()).unwrap();
    fakes.key_value.set_down("127.0.0.1:6379");
    ctx.connect_all().await;

    let snapshot = ctx.aggregator.get_all_metrics().await;

    assert!(snapshot.redis.is_empty());
    assert_eq!(snapshot.summary.offline_services, 1);
    assert_eq!(snapshot.summary.online_services, 3);
}

#[tokio::test]
async fn loading_node_reports_warning() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::Redis, &redis_document(Some("127.0.0.1:6379"), &[])).unwrap();
    let (ctx, fakes) = context(dir.path()).unwrap();
    fakes.key_value.set_info(fixtures::INFO_LOADING);
    ctx.connect_all().await;

    let snapshot = ctx.aggregator.get_all_metrics().await;

    assert_eq!(snapshot.redis[0].status, ServiceStatus::Warning);
    assert_eq!(snapshot.summary.warning_services, 1);
    assert_eq!(snapshot.summary.health_percentage, 0.0);
}

#[tokio::test]
async fn empty_configuration_yields_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;

    let snapshot = ctx.aggregator.get_all_metrics().await;

    assert_eq!(snapshot.record_count(), 0);
    assert_eq!(snapshot.summary.total_services, 0);
    assert_eq!(snapshot.summary.health_percentage, 0.0);
}

#[tokio::test]
async fn records_are_ordered_by_name() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        Family::PostgreSql,
        &relational_document(Family::PostgreSql, &["zeta", "alpha", "mid"]),
    )
    .unwrap();
    let (ctx, _fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;

    let snapshot = ctx.aggregator.get_all_metrics().await;

    let names: Vec<&str> = snapshot.postgresql.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn group_listing_failure_keeps_broker_record() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::Kafka, &kafka_document("events", &["kafka-1:9092"])).unwrap();
    let (ctx, fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;
    fakes.broker.fail_groups(true);

    let snapshot = ctx.aggregator.get_all_metrics().await;

    assert_eq!(snapshot.kafka.len(), 1);
    assert!(snapshot.kafka[0].consumer_groups.is_empty());
    assert_eq!(snapshot.summary.online_services, 1);
}

#[tokio::test]
async fn under_replicated_topic_marks_broker_warning() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::Kafka, &kafka_document("events", &["kafka-1:9092"])).unwrap();
    let (ctx, fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;
    let mut metadata = fixtures::broker_metadata();
    metadata.topics[0].partitions[1].replicas = vec![1, 2];
    fakes.broker.set_metadata(metadata);

    let snapshot = ctx.aggregator.get_all_metrics().await;

    let kafka = &snapshot.kafka[0];
    assert_eq!(kafka.under_replicated_partitions, 1);
    assert_eq!(kafka.status, ServiceStatus::Warning);
    assert_eq!(snapshot.summary.warning_services, 1);
    assert_eq!(snapshot.summary.online_services, 0);
}
