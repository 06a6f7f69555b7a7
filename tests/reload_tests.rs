//! Hot reload: change routing, rejection of bad documents and the watcher.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};

use stackwatch::application::ConfigChange;
use stackwatch::domain::{Family, KeyValueMode, OverallStatus};
use stackwatch::testkit::config::{
    context, kafka_document, redis_document, relational_document, write_document,
};

async fn notify(ctx: &stackwatch::infrastructure::bootstrap::AppContext, family: Family) {
    for task in ctx.coordinator.notify_changed(ConfigChange { family }) {
        task.await.unwrap();
    }
}

fn bump_mtime(path: &Path) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
}

#[tokio::test]
async fn change_rebuilds_only_the_changed_family() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::Redis, &redis_document(Some("127.0.0.1:6379"), &[])).unwrap();
    write_document(
        dir.path(),
        Family::PostgreSql,
        &relational_document(Family::PostgreSql, &["main"]),
    )
    .unwrap();
    let (ctx, fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;

    write_document(dir.path(), Family::Redis, &redis_document(None, &["10.0.0.1:7000"])).unwrap();
    notify(&ctx, Family::Redis).await;

    assert_eq!(fakes.key_value.closes(), 1);
    assert!(!ctx.registries.key_value.is_connected(KeyValueMode::Single));
    assert!(ctx.registries.key_value.is_connected(KeyValueMode::Cluster));
    assert_eq!(ctx.store.redis().nodes.len(), 1);

    assert_eq!(fakes.postgres.connects(), 1);
    assert_eq!(fakes.postgres.closes(), 0);
    assert_eq!(ctx.registries.postgres.status().status, OverallStatus::Connected);
}

#[tokio::test]
async fn invalid_document_keeps_previous_configuration() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::Kafka, &kafka_document("events", &["kafka-1:9092"])).unwrap();
    write_document(dir.path(), Family::Redis, &redis_document(Some("127.0.0.1:6379"), &[])).unwrap();
    let (ctx, fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;

    write_document(dir.path(), Family::Kafka, "[kafka]\nname = \"events\"\nbrokers = []\n").unwrap();
    notify(&ctx, Family::Kafka).await;

    assert_eq!(ctx.store.kafka().brokers, vec!["kafka-1:9092".to_string()]);
    assert!(ctx.registries.broker.is_connected());
    assert_eq!(fakes.broker.connects(), 1);
    assert_eq!(fakes.broker.closes(), 0);

    assert_eq!(ctx.registries.key_value.status().status, OverallStatus::Connected);
    assert!(ctx.store.redis().single.is_some());
    assert_eq!(fakes.key_value.connects(), 1);
    assert_eq!(fakes.key_value.closes(), 0);
}

#[tokio::test]
async fn malformed_toml_is_rejected_the_same_way() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::MySql, &relational_document(Family::MySql, &["shop"])).unwrap();
    let (ctx, fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;

    write_document(dir.path(), Family::MySql, "[[mysql.databases]\nname = ").unwrap();
    notify(&ctx, Family::MySql).await;

    assert_eq!(ctx.store.mysql().databases.len(), 1);
    assert!(ctx.registries.mysql.is_connected());
    assert_eq!(fakes.mysql.closes(), 0);
}

#[tokio::test]
async fn watcher_applies_edited_file() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), Family::Redis, &redis_document(Some("127.0.0.1:6379"), &[])).unwrap();
    let (ctx, _fakes) = context(dir.path()).unwrap();
    ctx.connect_all().await;
    let watcher = ctx.watch_config();

    write_document(
        dir.path(),
        Family::Redis,
        &redis_document(Some("127.0.0.1:6380"), &[]),
    )
    .unwrap();
    bump_mtime(&ctx.store.path(Family::Redis));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let names: Vec<String> = ctx
            .registries
            .key_value
            .status()
            .instances
            .into_iter()
            .map(|i| i.name)
            .collect();
        if names == vec!["single:127.0.0.1:6380".to_string()] {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "reload not applied, instances: {names:?}"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    watcher.abort();
}
