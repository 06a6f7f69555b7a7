//! Handler for the `run` command.

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::{live_context, output};
use crate::adapter::outbound::websocket::SnapshotServer;
use crate::error::Result;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::config::ConfigStore;

fn apply_overrides(settings: &mut Settings, args: &RunArgs) -> Result<()> {
    if let Some(level) = &args.log_level {
        settings.logging.level.clone_from(level);
    }
    if args.json_logs || output::is_json() {
        settings.logging.format = LogFormat::Json;
    }
    if let Some(listen) = &args.listen {
        settings.server.listen.clone_from(listen);
    }
    settings.server.addr()?;
    Ok(())
}

/// Execute the run command.
///
/// Runs in the foreground until ctrl-c.
pub async fn execute(mut settings: Settings, args: &RunArgs) -> Result<()> {
    apply_overrides(&mut settings, args)?;
    settings.init_logging();

    let written = ConfigStore::new(&settings.config_dir).ensure_defaults(false)?;
    for family in &written {
        output::note(&format!("wrote example {family} document"));
    }

    let addr = settings.server.addr()?;
    let watch = !args.no_watch;
    let context = live_context(settings)?;
    for (family, outcome) in context.connect_all().await {
        if let Err(e) = outcome {
            output::warning(&format!("{family}: {e}"));
        }
    }
    context.broadcaster.start();
    let watcher = watch.then(|| context.watch_config());

    let server = SnapshotServer::bind(addr, context.broadcaster.clone()).await?;
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Listening", format!("ws://{}", server.local_addr()?));
    output::field("Config dir", context.store.dir().display());
    output::field("Hot reload", if watch { "enabled" } else { "disabled" });

    server
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Unable to listen for shutdown signal");
            }
        })
        .await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    context.shutdown().await;
    output::success("Stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(listen: Option<&str>) -> RunArgs {
        RunArgs {
            listen: listen.map(str::to_string),
            log_level: Some("debug".into()),
            json_logs: false,
            no_watch: false,
        }
    }

    #[test]
    fn overrides_replace_listen_and_level() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &args(Some("127.0.0.1:9000"))).unwrap();
        assert_eq!(settings.server.listen, "127.0.0.1:9000");
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn invalid_listen_is_rejected() {
        let mut settings = Settings::default();
        assert!(apply_overrides(&mut settings, &args(Some("not-an-address"))).is_err());
    }
}
