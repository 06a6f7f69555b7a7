//! Cluster topology overview against a scripted cluster.

use std::sync::Arc;
use std::time::Duration;

use stackwatch::application::ClusterTopologyAnalyzer;
use stackwatch::domain::ClusterState;
use stackwatch::error::ClusterQueryError;
use stackwatch::testkit::backend::FakeKeyValue;
use stackwatch::testkit::fixtures::CLUSTER_ADDRESSES;

fn analyzer(kv: &FakeKeyValue) -> ClusterTopologyAnalyzer {
    ClusterTopologyAnalyzer::new(Arc::new(kv.clone()), Duration::from_millis(200))
}

fn addresses(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| (*a).to_string()).collect()
}

#[tokio::test]
async fn overview_sums_every_sampled_node() {
    let kv = FakeKeyValue::new();
    let overview = analyzer(&kv)
        .overview(&addresses(&CLUSTER_ADDRESSES[..1]), "")
        .await
        .unwrap();

    assert_eq!(overview.total_nodes, 4);
    assert_eq!(overview.master_nodes, 3);
    assert_eq!(overview.slave_nodes, 1);
    assert_eq!(overview.assigned_slots, 16384);
    assert_eq!(overview.total_slots, 16384);
    assert_eq!(overview.cluster_state, ClusterState::Ok);

    assert_eq!(overview.sample_node_counted_for, 4);
    assert_eq!(overview.used_memory_bytes, 4 * 1_048_576);
    assert_eq!(overview.total_memory_bytes, 4 * 8_589_934_592);
    assert_eq!(overview.used_memory_human, "4.0M");
    assert_eq!(overview.total_memory_human, "32.0G");
    assert_eq!(overview.total_connections, 12);
    assert_eq!(overview.total_commands_per_sec, 48);
}

#[tokio::test]
async fn unreachable_first_address_falls_through_to_the_next() {
    let kv = FakeKeyValue::new();
    kv.set_down("10.0.0.1:7000");

    let overview = analyzer(&kv)
        .overview(&addresses(&CLUSTER_ADDRESSES), "")
        .await
        .unwrap();

    assert_eq!(overview.total_nodes, 4);
    assert_eq!(overview.sample_node_counted_for, 3);
    assert_eq!(overview.total_connections, 9);
}

#[tokio::test]
async fn empty_address_list_is_rejected() {
    let kv = FakeKeyValue::new();
    let err = analyzer(&kv).overview(&[], "").await.unwrap_err();
    assert!(matches!(err, ClusterQueryError::NoAddresses));
    assert_eq!(kv.connects(), 0);
}

#[tokio::test]
async fn no_reachable_address_reports_every_attempt() {
    let kv = FakeKeyValue::new();
    kv.set_down("10.0.0.1:7000");
    kv.set_down("10.0.0.2:7001");

    let err = analyzer(&kv)
        .overview(&addresses(&CLUSTER_ADDRESSES[..2]), "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClusterQueryError::NoReachableAddress { attempts: 2, .. }
    ));
}

#[tokio::test]
async fn node_without_cluster_support_is_not_a_topology_source() {
    let kv = FakeKeyValue::new();
    kv.set_cluster_nodes("");

    let err = analyzer(&kv)
        .overview(&addresses(&["127.0.0.1:6379"]), "")
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterQueryError::NoReachableAddress { .. }));
}

#[tokio::test]
async fn short_lived_connections_are_closed() {
    let kv = FakeKeyValue::new();
    analyzer(&kv)
        .overview(&addresses(&CLUSTER_ADDRESSES[..1]), "")
        .await
        .unwrap();
    assert_eq!(kv.connects(), 5);
    assert_eq!(kv.closes(), 5);
}

#[tokio::test(start_paused = true)]
async fn slow_nodes_are_left_out_of_totals() {
    let kv = FakeKeyValue::new();
    kv.set_info_delay(Duration::from_secs(30));

    let overview = analyzer(&kv)
        .overview(&addresses(&CLUSTER_ADDRESSES[..1]), "")
        .await
        .unwrap();

    assert_eq!(overview.total_nodes, 4);
    assert_eq!(overview.sample_node_counted_for, 0);
    assert_eq!(overview.used_memory_human, "0B");
}
