//! Integration tests for the OpenTelemetry metric recorders
//!
//! Instruments are exported through an in-memory exporter so the recorded
//! values can be read back the way a collector would see them.

use frolf_events_domain::GuildId;
use frolf_events_infrastructure::{
    ClubMetrics, DiscordMetrics, ImporterMetrics, OtelClubMetrics, OtelDiscordMetrics, OtelImporterMetrics,
    OtelRegistryMetrics, RegistryMetrics,
};
use opentelemetry::metrics::MeterProvider;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    provider: SdkMeterProvider,
    exporter: InMemoryMetricExporter,
}

impl Harness {
    fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        Self { provider, exporter }
    }

    fn collect(&self) -> Vec<ResourceMetrics> {
        self.provider.force_flush().unwrap();
        self.exporter.get_finished_metrics().unwrap()
    }

    /// Sum of every data point of `name` in the latest export
    #[allow(clippy::let_and_return)]
    fn value(&self, name: &str) -> Option<f64> {
        let exports = self.collect();
        let latest = exports.last()?;
        // The iterator borrows `exports`; it must finish before `exports` drops
        let value = latest
            .scope_metrics()
            .flat_map(|sm| sm.metrics())
            .find(|m| m.name() == name)
            .map(|m| match m.data() {
                AggregatedMetrics::U64(MetricData::Sum(sum)) => sum.data_points().map(|dp| dp.value() as f64).sum(),
                AggregatedMetrics::I64(MetricData::Sum(sum)) => sum.data_points().map(|dp| dp.value() as f64).sum(),
                AggregatedMetrics::I64(MetricData::Gauge(gauge)) => {
                    gauge.data_points().map(|dp| dp.value() as f64).sum()
                }
                AggregatedMetrics::F64(MetricData::Histogram(hist)) => {
                    hist.data_points().map(|dp| dp.count() as f64).sum()
                }
                _ => f64::NAN,
            });
        value
    }
}

// ============================================================================
// Registry metrics
// ============================================================================

#[test]
fn test_registry_counters_and_error_snapshot() {
    let harness = Harness::new();
    let metrics = OtelRegistryMetrics::new(&harness.provider.meter("registry"), || 0);
    let guild = GuildId::new("g1");

    metrics.record_cache_hit(&guild);
    metrics.record_cache_hit(&guild);
    metrics.record_cache_miss(&guild);
    metrics.record_error(&guild, "timeout");

    assert_eq!(metrics.error_metrics()["timeout"]["g1"], 1);
    assert_eq!(harness.value("registry_cache_hits_total"), Some(2.0));
    assert_eq!(harness.value("registry_cache_misses_total"), Some(1.0));
    assert_eq!(harness.value("registry_errors_total"), Some(1.0));
}

#[test]
fn test_registry_latency_and_inflight() {
    let harness = Harness::new();
    let metrics = OtelRegistryMetrics::new(&harness.provider.meter("registry"), || 0);
    let guild = GuildId::new("g1");

    metrics.record_config_request(&guild, true, Duration::from_millis(12));
    metrics.record_config_request(&guild, false, Duration::from_millis(40));
    metrics.record_cache_operation("get", Duration::from_micros(300));
    metrics.record_inflight_request(&guild, 1);
    metrics.record_inflight_request(&guild, 1);
    metrics.record_inflight_request(&guild, -1);

    assert_eq!(harness.value("registry_config_requests_total"), Some(2.0));
    assert_eq!(harness.value("registry_config_request_duration_seconds"), Some(2.0));
    assert_eq!(harness.value("registry_cache_operation_duration_seconds"), Some(1.0));
    assert_eq!(harness.value("registry_inflight_requests"), Some(1.0));
}

#[test]
fn test_cache_size_gauge_reads_callback() {
    let harness = Harness::new();
    let size = Arc::new(AtomicI64::new(3));
    let observed = size.clone();
    let _metrics = OtelRegistryMetrics::new(&harness.provider.meter("registry"), move || {
        observed.load(Ordering::Relaxed)
    });

    assert_eq!(harness.value("registry_cache_size"), Some(3.0));

    size.store(7, Ordering::Relaxed);
    assert_eq!(harness.value("registry_cache_size"), Some(7.0));
}

#[test]
fn test_error_snapshot_reset() {
    let harness = Harness::new();
    let metrics = OtelRegistryMetrics::new(&harness.provider.meter("registry"), || 0);

    metrics.record_error(&GuildId::new("g1"), "timeout");
    metrics.record_error(&GuildId::new("g2"), "timeout");
    metrics.record_error(&GuildId::new("g1"), "not_found");

    let snapshot = metrics.error_metrics();
    assert_eq!(snapshot["timeout"].len(), 2);
    assert_eq!(snapshot["not_found"]["g1"], 1);

    metrics.reset_error_metrics();
    assert!(metrics.error_metrics().is_empty());
    // The exported counter is cumulative and unaffected by the reset
    assert_eq!(harness.value("registry_errors_total"), Some(3.0));
}

// ============================================================================
// Service metrics
// ============================================================================

#[test]
fn test_discord_metrics() {
    let harness = Harness::new();
    let metrics = OtelDiscordMetrics::new(&harness.provider.meter("discord"));

    metrics.record_api_request("/channels/{id}/messages", 200, Duration::from_millis(80));
    metrics.record_api_request("/channels/{id}/messages", 429, Duration::from_millis(5));
    metrics.record_rate_limit("/channels/{id}/messages", Duration::from_secs(2));
    metrics.record_websocket_reconnect("heartbeat timeout");

    assert_eq!(harness.value("discord_api_requests_total"), Some(2.0));
    assert_eq!(harness.value("discord_rate_limits_total"), Some(1.0));
    assert_eq!(harness.value("discord_websocket_reconnects_total"), Some(1.0));
}

#[test]
fn test_club_metrics() {
    let harness = Harness::new();
    let metrics = OtelClubMetrics::new(&harness.provider.meter("club"));

    metrics.record_club_info_request("club-1", true, Duration::from_millis(15));
    metrics.record_club_upsert("club-1", true);
    metrics.record_club_upsert("club-1", false);

    assert_eq!(harness.value("club_info_requests_total"), Some(1.0));
    assert_eq!(harness.value("club_upserts_total"), Some(2.0));
}

#[test]
fn test_importer_metrics() {
    let harness = Harness::new();
    let metrics = OtelImporterMetrics::new(&harness.provider.meter("importer"));

    metrics.record_import_attempt("g1", "csv");
    metrics.record_import_attempt("g1", "xlsx");
    metrics.record_import_success("g1", "csv");
    metrics.record_import_failure("g1", "xlsx", "parse");
    metrics.record_rows_parsed("csv", 18);
    metrics.record_parse_duration("csv", Duration::from_millis(250));

    assert_eq!(harness.value("scorecard_import_attempts_total"), Some(2.0));
    assert_eq!(harness.value("scorecard_import_successes_total"), Some(1.0));
    assert_eq!(harness.value("scorecard_import_failures_total"), Some(1.0));
    assert_eq!(harness.value("scorecard_rows_parsed_total"), Some(18.0));
    assert_eq!(harness.value("scorecard_parse_duration_seconds"), Some(1.0));
}
