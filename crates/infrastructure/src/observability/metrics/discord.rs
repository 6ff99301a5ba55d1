//! Discord API metrics.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::time::Duration;

/// Records calls made by the bot against the Discord API and gateway.
pub trait DiscordMetrics: Send + Sync {
    /// A REST call finished with HTTP `status`
    fn record_api_request(&self, endpoint: &str, status: u16, duration: Duration);

    /// Discord asked the bot to back off for `retry_after`
    fn record_rate_limit(&self, endpoint: &str, retry_after: Duration);

    /// The gateway connection was re-established
    fn record_websocket_reconnect(&self, reason: &str);
}

pub struct OtelDiscordMetrics {
    api_requests: Counter<u64>,
    api_request_duration: Histogram<f64>,
    rate_limits: Counter<u64>,
    rate_limit_wait: Histogram<f64>,
    websocket_reconnects: Counter<u64>,
}

impl OtelDiscordMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            api_requests: meter
                .u64_counter("discord_api_requests_total")
                .with_description("Discord REST calls by endpoint and status")
                .build(),
            api_request_duration: meter
                .f64_histogram("discord_api_request_duration_seconds")
                .with_description("Latency of Discord REST calls")
                .with_unit("s")
                .build(),
            rate_limits: meter
                .u64_counter("discord_rate_limits_total")
                .with_description("Rate-limit responses from Discord")
                .build(),
            rate_limit_wait: meter
                .f64_histogram("discord_rate_limit_wait_seconds")
                .with_description("Back-off requested by Discord")
                .with_unit("s")
                .build(),
            websocket_reconnects: meter
                .u64_counter("discord_websocket_reconnects_total")
                .with_description("Gateway reconnections")
                .build(),
        }
    }
}

/// Collapse a status code into its class, e.g. `4xx`
fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

impl DiscordMetrics for OtelDiscordMetrics {
    fn record_api_request(&self, endpoint: &str, status: u16, duration: Duration) {
        let attrs = [
            KeyValue::new("endpoint", endpoint.to_string()),
            KeyValue::new("status", i64::from(status)),
            KeyValue::new("status_class", status_class(status)),
        ];
        self.api_requests.add(1, &attrs);
        self.api_request_duration.record(duration.as_secs_f64(), &attrs);
    }

    fn record_rate_limit(&self, endpoint: &str, retry_after: Duration) {
        let attrs = [KeyValue::new("endpoint", endpoint.to_string())];
        self.rate_limits.add(1, &attrs);
        self.rate_limit_wait.record(retry_after.as_secs_f64(), &attrs);
    }

    fn record_websocket_reconnect(&self, reason: &str) {
        self.websocket_reconnects
            .add(1, &[KeyValue::new("reason", reason.to_string())]);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiscordMetrics;

impl DiscordMetrics for NoopDiscordMetrics {
    fn record_api_request(&self, _endpoint: &str, _status: u16, _duration: Duration) {}
    fn record_rate_limit(&self, _endpoint: &str, _retry_after: Duration) {}
    fn record_websocket_reconnect(&self, _reason: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(204), "2xx");
        assert_eq!(status_class(429), "4xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(0), "other");
    }
}
