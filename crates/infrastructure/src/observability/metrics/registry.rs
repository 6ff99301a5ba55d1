//! Guild-config registry metrics.
//!
//! The Discord bot caches guild configurations; these instruments expose the
//! cache hit ratio, backend latency, in-flight lookups and error patterns.

use frolf_events_domain::GuildId;
use opentelemetry::metrics::{Counter, Histogram, Meter, ObservableGauge, UpDownCounter};
use opentelemetry::KeyValue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

/// Error counts keyed by error type, then guild id
pub type ErrorSnapshot = HashMap<String, HashMap<String, u64>>;

/// Records registry cache activity.
pub trait RegistryMetrics: Send + Sync {
    /// A config lookup against the backend finished
    fn record_config_request(&self, guild_id: &GuildId, success: bool, duration: Duration);

    fn record_cache_hit(&self, guild_id: &GuildId);

    fn record_cache_miss(&self, guild_id: &GuildId);

    /// A lookup failed with `error_type`
    fn record_error(&self, guild_id: &GuildId, error_type: &str);

    /// A cache operation (get, set, invalidate, ...) finished
    fn record_cache_operation(&self, operation: &str, duration: Duration);

    /// Adjust the number of lookups in flight by `delta`
    fn record_inflight_request(&self, guild_id: &GuildId, delta: i64);

    /// Copy of the error counts recorded so far
    fn error_metrics(&self) -> ErrorSnapshot;

    /// Forget recorded error counts
    fn reset_error_metrics(&self);
}

/// Error counts kept alongside `registry_errors_total` so they can be read
/// back without a metrics backend.
#[derive(Debug, Default)]
pub struct ErrorStats {
    counts: RwLock<ErrorSnapshot>,
}

impl ErrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, error_type: &str, guild_id: &str) {
        let mut counts = self.counts.write();
        *counts
            .entry(error_type.to_string())
            .or_default()
            .entry(guild_id.to_string())
            .or_default() += 1;
    }

    /// Deep copy of the current counts
    pub fn snapshot(&self) -> ErrorSnapshot {
        self.counts.read().clone()
    }

    pub fn reset(&self) {
        self.counts.write().clear();
    }
}

/// OpenTelemetry-backed registry metrics.
pub struct OtelRegistryMetrics {
    config_requests: Counter<u64>,
    cache_hits: Counter<u64>,
    cache_misses: Counter<u64>,
    errors: Counter<u64>,
    config_request_duration: Histogram<f64>,
    cache_operation_duration: Histogram<f64>,
    inflight_requests: UpDownCounter<i64>,
    _cache_size: ObservableGauge<i64>,
    error_stats: ErrorStats,
}

impl OtelRegistryMetrics {
    /// Build every instrument on `meter`.
    ///
    /// `cache_size` is invoked by the metrics backend on each collection,
    /// possibly concurrently with recording. It must not block; read an
    /// atomic counter rather than walking the cache.
    pub fn new<F>(meter: &Meter, cache_size: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            config_requests: meter
                .u64_counter("registry_config_requests_total")
                .with_description("Guild config lookups against the backend")
                .build(),
            cache_hits: meter
                .u64_counter("registry_cache_hits_total")
                .with_description("Guild config cache hits")
                .build(),
            cache_misses: meter
                .u64_counter("registry_cache_misses_total")
                .with_description("Guild config cache misses")
                .build(),
            errors: meter
                .u64_counter("registry_errors_total")
                .with_description("Guild config lookup errors by type")
                .build(),
            config_request_duration: meter
                .f64_histogram("registry_config_request_duration_seconds")
                .with_description("Latency of guild config lookups")
                .with_unit("s")
                .build(),
            cache_operation_duration: meter
                .f64_histogram("registry_cache_operation_duration_seconds")
                .with_description("Latency of cache operations")
                .with_unit("s")
                .build(),
            inflight_requests: meter
                .i64_up_down_counter("registry_inflight_requests")
                .with_description("Guild config lookups in flight")
                .build(),
            _cache_size: meter
                .i64_observable_gauge("registry_cache_size")
                .with_description("Guild configs held in the cache")
                .with_callback(move |observer| observer.observe(cache_size(), &[]))
                .build(),
            error_stats: ErrorStats::new(),
        }
    }
}

fn guild_attr(guild_id: &GuildId) -> KeyValue {
    KeyValue::new("guild_id", guild_id.to_string())
}

fn operation_attr(operation: &str) -> KeyValue {
    KeyValue::new("operation", operation.to_string())
}

impl RegistryMetrics for OtelRegistryMetrics {
    fn record_config_request(&self, guild_id: &GuildId, success: bool, duration: Duration) {
        let attrs = [
            guild_attr(guild_id),
            KeyValue::new("success", success),
            operation_attr("config_request"),
        ];
        self.config_requests.add(1, &attrs);
        self.config_request_duration.record(duration.as_secs_f64(), &attrs);
    }

    fn record_cache_hit(&self, guild_id: &GuildId) {
        self.cache_hits
            .add(1, &[guild_attr(guild_id), operation_attr("cache_hit")]);
    }

    fn record_cache_miss(&self, guild_id: &GuildId) {
        self.cache_misses
            .add(1, &[guild_attr(guild_id), operation_attr("cache_miss")]);
    }

    fn record_error(&self, guild_id: &GuildId, error_type: &str) {
        self.errors.add(
            1,
            &[
                guild_attr(guild_id),
                KeyValue::new("error_type", error_type.to_string()),
                operation_attr("error"),
            ],
        );
        self.error_stats.increment(error_type, guild_id.as_str());
    }

    fn record_cache_operation(&self, operation: &str, duration: Duration) {
        self.cache_operation_duration
            .record(duration.as_secs_f64(), &[operation_attr(operation)]);
    }

    fn record_inflight_request(&self, guild_id: &GuildId, delta: i64) {
        self.inflight_requests
            .add(delta, &[guild_attr(guild_id), operation_attr("inflight_request")]);
    }

    fn error_metrics(&self) -> ErrorSnapshot {
        self.error_stats.snapshot()
    }

    fn reset_error_metrics(&self) {
        self.error_stats.reset();
    }
}

/// Registry metrics that record nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistryMetrics;

impl RegistryMetrics for NoopRegistryMetrics {
    fn record_config_request(&self, _guild_id: &GuildId, _success: bool, _duration: Duration) {}
    fn record_cache_hit(&self, _guild_id: &GuildId) {}
    fn record_cache_miss(&self, _guild_id: &GuildId) {}
    fn record_error(&self, _guild_id: &GuildId, _error_type: &str) {}
    fn record_cache_operation(&self, _operation: &str, _duration: Duration) {}
    fn record_inflight_request(&self, _guild_id: &GuildId, _delta: i64) {}

    fn error_metrics(&self) -> ErrorSnapshot {
        ErrorSnapshot::new()
    }

    fn reset_error_metrics(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider;
    use opentelemetry_sdk::metrics::SdkMeterProvider;

    #[test]
    fn test_snapshot_is_isolated() {
        let stats = ErrorStats::new();
        stats.increment("timeout", "g1");

        let mut snapshot = stats.snapshot();
        snapshot.get_mut("timeout").unwrap().insert("g1".into(), 99);
        snapshot.insert("other".into(), HashMap::new());

        let fresh = stats.snapshot();
        assert_eq!(fresh["timeout"]["g1"], 1);
        assert!(!fresh.contains_key("other"));
    }

    #[test]
    fn test_error_stats_counts_per_guild() {
        let stats = ErrorStats::new();
        stats.increment("timeout", "g1");
        stats.increment("timeout", "g1");
        stats.increment("timeout", "g2");
        stats.increment("not_found", "g1");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot["timeout"]["g1"], 2);
        assert_eq!(snapshot["timeout"]["g2"], 1);
        assert_eq!(snapshot["not_found"]["g1"], 1);

        stats.reset();
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn test_otel_error_metrics_track_record_error() {
        let provider = SdkMeterProvider::builder().build();
        let metrics = OtelRegistryMetrics::new(&provider.meter("test"), || 0);
        let guild = GuildId::new("g1");

        metrics.record_error(&guild, "timeout");
        metrics.record_cache_hit(&guild);
        assert_eq!(metrics.error_metrics()["timeout"]["g1"], 1);

        metrics.reset_error_metrics();
        assert!(metrics.error_metrics().is_empty());
    }

    #[test]
    fn test_noop_is_empty() {
        let metrics = NoopRegistryMetrics;
        metrics.record_error(&GuildId::new("g1"), "timeout");
        assert!(metrics.error_metrics().is_empty());
    }
}
