//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Live health and performance monitor for Redis, Kafka, PostgreSQL and MySQL.
#[derive(Parser, Debug)]
#[command(name = "stackwatch")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the service settings file.
    #[arg(short, long, global = true, default_value = "stackwatch.toml")]
    pub settings: PathBuf,

    /// Override the per-family configuration directory.
    #[arg(long, global = true, env = "STACKWATCH_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect, broadcast snapshots and watch the config directory (foreground)
    Run(RunArgs),

    /// Connect once and show per-family connection status
    Status,

    /// Connect once and print a metrics snapshot
    Metrics(MetricsArgs),

    /// Show cluster topology and resource totals
    Cluster(ClusterArgs),

    /// Manage per-family configuration files
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write the default document of every family that has none.
    Init(ConfigInitArgs),
    /// Parse and validate every family document.
    Validate,
}

#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite existing documents.
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Override the realtime listen address.
    #[arg(long)]
    pub listen: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,

    /// Do not reload when configuration files change.
    #[arg(long)]
    pub no_watch: bool,
}

#[derive(Parser, Debug)]
pub struct MetricsArgs {
    /// Keep printing a summary line on every broadcast tick.
    #[arg(long)]
    pub watch: bool,

    /// Stop watching after this many snapshots.
    #[arg(long, requires = "watch")]
    pub count: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct ClusterArgs {
    /// Node address to query (host:port); repeatable. Defaults to the
    /// configured cluster nodes.
    #[arg(long = "addr")]
    pub addresses: Vec<String>,

    /// Password for the cluster nodes. Defaults to the configured one.
    #[arg(long, env = "STACKWATCH_CLUSTER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
