//! Handler for the `cluster` command.

use serde_json::json;
use tabled::Tabled;
use tracing::warn;

use crate::adapter::inbound::cli::command::ClusterArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::{ClusterOverview, NodeRole};
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Role")]
    role: &'static str,
    #[tabled(rename = "Slots")]
    slots: u32,
    #[tabled(rename = "Id")]
    id: String,
}

fn print_overview(overview: &ClusterOverview) {
    output::section("Cluster");
    output::field("State", overview.cluster_state.as_str());
    output::field(
        "Nodes",
        format!(
            "{} ({} masters, {} slaves)",
            overview.total_nodes, overview.master_nodes, overview.slave_nodes
        ),
    );
    output::field(
        "Slots",
        format!("{}/{}", overview.assigned_slots, overview.total_slots),
    );
    output::field(
        "Memory",
        format!("{} / {}", overview.used_memory_human, overview.total_memory_human),
    );
    output::field("Connections", overview.total_connections);
    output::field("Ops/sec", overview.total_commands_per_sec);
    output::field(
        "Sampled",
        format!("{} of {} nodes", overview.sample_node_counted_for, overview.total_nodes),
    );

    output::section("Nodes");
    output::table(overview.nodes.iter().map(|node| NodeRow {
        address: node.address.clone(),
        role: match node.role {
            NodeRole::Master => "master",
            NodeRole::Slave => "slave",
        },
        slots: node.assigned_slot_count,
        id: output::muted(&node.id),
    }));
}

/// Execute the cluster command.
///
/// Addresses and password fall back to the configured cluster nodes.
pub async fn execute(context: AppContext, args: &ClusterArgs) -> Result<()> {
    let registry = &context.registries.key_value;
    if let Err(e) = registry.connect(&context.store.redis()).await {
        warn!(error = %e, "Configured nodes unreachable; querying anyway");
    }
    let addresses = if args.addresses.is_empty() {
        registry.cluster_addresses()
    } else {
        args.addresses.clone()
    };
    let password = args
        .password
        .clone()
        .unwrap_or_else(|| registry.cluster_password());

    let result = context.analyzer.overview(&addresses, &password).await;
    context.shutdown().await;
    let overview = result?;

    if output::is_json() {
        output::json_output(json!({
            "command": "cluster",
            "overview": overview,
        }));
    } else {
        print_overview(&overview);
    }
    Ok(())
}
