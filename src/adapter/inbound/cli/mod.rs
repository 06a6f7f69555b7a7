//! CLI module graph and shared loading helpers.

pub mod cluster;
pub mod command;
pub mod config;
pub mod metrics;
pub mod output;
pub mod run;
pub mod status;

use std::sync::Arc;

use self::command::{Cli, Commands, ConfigCommand};
use crate::error::Result;
use crate::infrastructure::bootstrap::{AppContext, Connectors};
use crate::infrastructure::config::logging::LoggingConfig;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::config::ConfigStore;

/// Settings from `--settings`, with `--config-dir` applied.
///
/// # Errors
///
/// Returns an error if an existing settings file is unreadable or invalid.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load_or_default(&cli.settings)?;
    if let Some(dir) = &cli.config_dir {
        settings.config_dir = dir.clone();
    }
    Ok(settings)
}

/// Open the config store and wire an application context over live backends.
///
/// # Errors
///
/// Returns an error if a family document fails to load.
pub fn live_context(settings: Settings) -> Result<AppContext> {
    let store = Arc::new(ConfigStore::open(&settings.config_dir)?);
    Ok(AppContext::new(settings, store, Connectors::live()))
}

/// Quiet logging for one-shot commands; `-v` raises the level.
fn init_command_logging() {
    let level = match output::verbosity() {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    LoggingConfig {
        level: level.into(),
        ..LoggingConfig::default()
    }
    .init();
}

/// Run the parsed command line.
///
/// # Errors
///
/// Returns the first error of the selected command.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    if !matches!(cli.command, Commands::Run(_)) {
        init_command_logging();
    }

    match cli.command {
        Commands::Run(args) => run::execute(settings, &args).await,
        Commands::Status => status::execute(live_context(settings)?).await,
        Commands::Metrics(args) => metrics::execute(live_context(settings)?, &args).await,
        Commands::Cluster(args) => cluster::execute(live_context(settings)?, &args).await,
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&settings, args.force),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&settings),
    }
}
