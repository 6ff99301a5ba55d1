//! Generate the EventCatalog tree from the AsyncAPI document.

use anyhow::{Context, Result};
use clap::Parser;
use frolf_events_cli::eventcatalog::{self, DEFAULT_INPUT, DEFAULT_OUTPUT};
use frolf_events_common::{init_tracing, TelemetryConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "eventcatalog-gen")]
#[command(author, version, about = "Generate EventCatalog pages from the frolf bot AsyncAPI document")]
struct Cli {
    /// AsyncAPI YAML to read
    #[arg(short, long, default_value = DEFAULT_INPUT, env = "FROLF_ASYNCAPI_INPUT")]
    input: PathBuf,

    /// Catalog root; its events, channels, services, domains and teams
    /// directories are replaced
    #[arg(short, long, default_value = DEFAULT_OUTPUT, env = "FROLF_EVENTCATALOG_OUTPUT")]
    output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> Result<()> {
    let summary = eventcatalog::run(&cli.input, &cli.output)
        .with_context(|| format!("failed to generate the event catalog from {}", cli.input.display()))?;

    eprintln!(
        "Generated {} events, {} services and {} domains in {}",
        summary.events,
        summary.services,
        summary.domains,
        cli.output.display()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig {
        service_name: "eventcatalog-gen".to_string(),
        log_level: if cli.verbose { "debug" } else { "info" }.to_string(),
        ..Default::default()
    };
    if let Err(e) = init_tracing(&telemetry) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
