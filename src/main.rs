use clap::Parser;
use stackwatch::adapter::inbound::cli::command::{Cli, ColorChoice};
use stackwatch::adapter::inbound::cli::output::{self, OutputConfig};
use stackwatch::adapter::inbound::cli::dispatch;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Err(e) = dispatch(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
