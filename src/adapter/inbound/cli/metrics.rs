//! Handler for the `metrics` command.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::MetricsArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::channel::ChannelSink;
use crate::domain::{bytes_to_human, MetricsSnapshot};
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Family")]
    family: &'static str,
    #[tabled(rename = "Instance")]
    name: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn rows(snapshot: &MetricsSnapshot) -> Vec<RecordRow> {
    let redis = snapshot.redis.iter().map(|r| RecordRow {
        family: "redis",
        name: r.name.clone(),
        endpoint: format!("{}:{}", r.host, r.port),
        status: output::service(r.status),
        detail: format!(
            "{} used, {} clients, {} ops/s",
            r.info.used_memory_human, r.info.connected_clients, r.info.instantaneous_ops_per_sec
        ),
    });
    let kafka = snapshot.kafka.iter().map(|k| RecordRow {
        family: "kafka",
        name: format!("{} (broker {})", k.name, k.broker_id),
        endpoint: format!("{}:{}", k.host, k.port),
        status: output::service(k.status),
        detail: format!(
            "{} topics, {} partitions, {} under-replicated",
            k.total_topics, k.total_partitions, k.under_replicated_partitions
        ),
    });
    let postgres = snapshot.postgresql.iter().map(|p| RecordRow {
        family: "postgresql",
        name: p.name.clone(),
        endpoint: format!("{}:{}", p.host, p.port),
        status: output::service(p.status),
        detail: format!(
            "{}, {} tables, {}/{} connections",
            p.database_size_human, p.table_count, p.active_connections, p.max_connections
        ),
    });
    let mysql = snapshot.mysql.iter().map(|m| RecordRow {
        family: "mysql",
        name: m.name.clone(),
        endpoint: format!("{}:{}", m.host, m.port),
        status: output::service(m.status),
        detail: format!(
            "{}, {} tables, {}/{} threads",
            m.database_size_human, m.table_count, m.threads_connected, m.max_connections
        ),
    });
    redis.chain(kafka).chain(postgres).chain(mysql).collect()
}

fn print_summary(snapshot: &MetricsSnapshot) {
    let summary = &snapshot.summary;
    output::section("Summary");
    output::field(
        "Services",
        format!(
            "{} total, {} online, {} warning, {} offline",
            summary.total_services,
            summary.online_services,
            summary.warning_services,
            summary.offline_services
        ),
    );
    output::field("Health", format!("{:.1}%", summary.health_percentage));
    output::field("Connections", summary.total_connections);
    output::field("Memory", bytes_to_human(summary.total_memory_used));
    output::field("Disk", bytes_to_human(summary.total_disk_used));
}

fn print_snapshot(snapshot: &MetricsSnapshot) -> Result<()> {
    if output::is_json() {
        output::json_output(serde_json::to_value(snapshot)?);
        return Ok(());
    }
    print_summary(snapshot);
    let rows = rows(snapshot);
    if !rows.is_empty() {
        output::section("Records");
        output::table(rows);
    }
    Ok(())
}

/// Execute the metrics command.
pub async fn execute(context: AppContext, args: &MetricsArgs) -> Result<()> {
    context.connect_all().await;

    let result = if args.watch {
        watch(&context, args.count).await
    } else {
        let snapshot = context.aggregator.get_all_metrics().await;
        print_snapshot(&snapshot)
    };

    context.shutdown().await;
    result
}

/// Subscribe in-process and print every pushed snapshot until `count` or ctrl-c.
async fn watch(context: &AppContext, count: Option<usize>) -> Result<()> {
    let (sink, mut snapshots) = ChannelSink::new(4);
    context.broadcaster.subscribe(sink).await?;
    context.broadcaster.start();

    let mut seen = 0;
    loop {
        let snapshot = tokio::select! {
            next = snapshots.recv() => match next {
                Some(snapshot) => snapshot,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };
        if output::is_json() {
            output::json_output(json!({
                "timestamp": snapshot.timestamp,
                "summary": snapshot.summary,
            }));
        } else {
            output::field(
                &snapshot.timestamp.format("%H:%M:%S").to_string(),
                format!(
                    "{} online, {} warning, {} offline ({:.1}%)",
                    snapshot.summary.online_services,
                    snapshot.summary.warning_services,
                    snapshot.summary.offline_services,
                    snapshot.summary.health_percentage
                ),
            );
        }
        seen += 1;
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
    }
    Ok(())
}
