//! Handler for the `status` command.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::output;
use crate::domain::FamilyStatus;
use crate::error::Result;
use crate::infrastructure::bootstrap::AppContext;

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Instance")]
    instance: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Error")]
    error: String,
}

fn rows(statuses: &[FamilyStatus]) -> Vec<InstanceRow> {
    statuses
        .iter()
        .flat_map(|family| {
            family.instances.iter().map(move |instance| InstanceRow {
                family: family.family.to_string(),
                instance: instance.name.clone(),
                state: output::overall(instance.status),
                error: instance.error.clone().unwrap_or_default(),
            })
        })
        .collect()
}

/// Execute the status command.
pub async fn execute(context: AppContext) -> Result<()> {
    context.connect_all().await;
    let statuses = context.registries.statuses();

    if output::is_json() {
        output::json_output(json!({
            "command": "status",
            "families": statuses,
        }));
    } else {
        output::header(env!("CARGO_PKG_VERSION"));
        output::section("Families");
        for family in &statuses {
            output::field(family.family.as_str(), output::overall(family.status));
        }
        let rows = rows(&statuses);
        if rows.is_empty() {
            output::note("No instances configured");
            output::hint("run `stackwatch config init` to write example documents");
        } else {
            output::section("Instances");
            output::table(rows);
        }
    }

    context.shutdown().await;
    Ok(())
}
