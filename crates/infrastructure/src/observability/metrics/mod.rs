//! Metric recorders.

pub mod club;
pub mod discord;
pub mod importer;
pub mod registry;

pub use club::{ClubMetrics, NoopClubMetrics, OtelClubMetrics};
pub use discord::{DiscordMetrics, NoopDiscordMetrics, OtelDiscordMetrics};
pub use importer::{ImporterMetrics, NoopImporterMetrics, OtelImporterMetrics};
pub use registry::{ErrorSnapshot, ErrorStats, NoopRegistryMetrics, OtelRegistryMetrics, RegistryMetrics};

use opentelemetry::metrics::Meter;

/// Instrumentation scope shared by every recorder
pub const METER_NAME: &str = "frolf-bot";

/// Meter from the globally installed provider
pub fn global_meter() -> Meter {
    opentelemetry::global::meter(METER_NAME)
}
