//! Print the AsyncAPI document for every V1 event as YAML.
//!
//! Takes no arguments and reads no files. Logs go to stderr so the output
//! can be redirected straight into `asyncapi/asyncapi.yaml`.

use anyhow::{Context, Result};
use frolf_events_cli::asyncapi;
use frolf_events_common::{init_tracing, TelemetryConfig};
use std::io::Write;

fn run() -> Result<()> {
    let registry = frolf_events_domain::events::v1_registry().context("failed to compose the V1 event registry")?;
    let yaml = asyncapi::render(&registry).context("failed to render the AsyncAPI document")?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(yaml.as_bytes())
        .and_then(|_| stdout.flush())
        .context("failed to write to stdout")?;

    tracing::debug!(topics = registry.len(), "AsyncAPI document written");
    Ok(())
}

fn main() {
    let telemetry = TelemetryConfig {
        service_name: "asyncapi-gen".to_string(),
        log_level: "warn".to_string(),
        ..Default::default()
    };
    if let Err(e) = init_tracing(&telemetry) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
