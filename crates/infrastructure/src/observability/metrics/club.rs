//! Club service metrics.
//!
//! A club groups several guilds playing on the same course network.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::time::Duration;

pub trait ClubMetrics: Send + Sync {
    /// A club info lookup finished
    fn record_club_info_request(&self, club_uuid: &str, success: bool, duration: Duration);

    /// A club record was created or updated
    fn record_club_upsert(&self, club_uuid: &str, created: bool);
}

pub struct OtelClubMetrics {
    info_requests: Counter<u64>,
    info_request_duration: Histogram<f64>,
    upserts: Counter<u64>,
}

impl OtelClubMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            info_requests: meter
                .u64_counter("club_info_requests_total")
                .with_description("Club info lookups")
                .build(),
            info_request_duration: meter
                .f64_histogram("club_info_request_duration_seconds")
                .with_description("Latency of club info lookups")
                .with_unit("s")
                .build(),
            upserts: meter
                .u64_counter("club_upserts_total")
                .with_description("Club records created or updated")
                .build(),
        }
    }
}

impl ClubMetrics for OtelClubMetrics {
    fn record_club_info_request(&self, club_uuid: &str, success: bool, duration: Duration) {
        let attrs = [
            KeyValue::new("club_uuid", club_uuid.to_string()),
            KeyValue::new("success", success),
        ];
        self.info_requests.add(1, &attrs);
        self.info_request_duration.record(duration.as_secs_f64(), &attrs);
    }

    fn record_club_upsert(&self, club_uuid: &str, created: bool) {
        let action = if created { "created" } else { "updated" };
        self.upserts.add(
            1,
            &[
                KeyValue::new("club_uuid", club_uuid.to_string()),
                KeyValue::new("action", action),
            ],
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClubMetrics;

impl ClubMetrics for NoopClubMetrics {
    fn record_club_info_request(&self, _club_uuid: &str, _success: bool, _duration: Duration) {}
    fn record_club_upsert(&self, _club_uuid: &str, _created: bool) {}
}
