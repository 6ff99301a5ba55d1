//! Scorecard importer metrics.
//!
//! Players upload UDisc scorecard exports; the importer parses them into
//! score updates for a round.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::time::Duration;

pub trait ImporterMetrics: Send + Sync {
    /// An import started for a file of `file_type` (csv, xlsx, ...)
    fn record_import_attempt(&self, guild_id: &str, file_type: &str);

    fn record_import_success(&self, guild_id: &str, file_type: &str);

    /// The import failed at `stage` (download, parse, match, ...)
    fn record_import_failure(&self, guild_id: &str, file_type: &str, stage: &str);

    /// Rows extracted from a scorecard
    fn record_rows_parsed(&self, file_type: &str, rows: u64);

    fn record_parse_duration(&self, file_type: &str, duration: Duration);
}

pub struct OtelImporterMetrics {
    attempts: Counter<u64>,
    successes: Counter<u64>,
    failures: Counter<u64>,
    rows_parsed: Counter<u64>,
    parse_duration: Histogram<f64>,
}

impl OtelImporterMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            attempts: meter
                .u64_counter("scorecard_import_attempts_total")
                .with_description("Scorecard imports started")
                .build(),
            successes: meter
                .u64_counter("scorecard_import_successes_total")
                .with_description("Scorecard imports completed")
                .build(),
            failures: meter
                .u64_counter("scorecard_import_failures_total")
                .with_description("Scorecard imports failed, by stage")
                .build(),
            rows_parsed: meter
                .u64_counter("scorecard_rows_parsed_total")
                .with_description("Rows parsed from scorecards")
                .build(),
            parse_duration: meter
                .f64_histogram("scorecard_parse_duration_seconds")
                .with_description("Time spent parsing a scorecard")
                .with_unit("s")
                .build(),
        }
    }
}

fn import_attrs(guild_id: &str, file_type: &str) -> [KeyValue; 2] {
    [
        KeyValue::new("guild_id", guild_id.to_string()),
        KeyValue::new("file_type", file_type.to_string()),
    ]
}

impl ImporterMetrics for OtelImporterMetrics {
    fn record_import_attempt(&self, guild_id: &str, file_type: &str) {
        self.attempts.add(1, &import_attrs(guild_id, file_type));
    }

    fn record_import_success(&self, guild_id: &str, file_type: &str) {
        self.successes.add(1, &import_attrs(guild_id, file_type));
    }

    fn record_import_failure(&self, guild_id: &str, file_type: &str, stage: &str) {
        let [guild, file] = import_attrs(guild_id, file_type);
        self.failures
            .add(1, &[guild, file, KeyValue::new("stage", stage.to_string())]);
    }

    fn record_rows_parsed(&self, file_type: &str, rows: u64) {
        self.rows_parsed
            .add(rows, &[KeyValue::new("file_type", file_type.to_string())]);
    }

    fn record_parse_duration(&self, file_type: &str, duration: Duration) {
        self.parse_duration
            .record(duration.as_secs_f64(), &[KeyValue::new("file_type", file_type.to_string())]);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopImporterMetrics;

impl ImporterMetrics for NoopImporterMetrics {
    fn record_import_attempt(&self, _guild_id: &str, _file_type: &str) {}
    fn record_import_success(&self, _guild_id: &str, _file_type: &str) {}
    fn record_import_failure(&self, _guild_id: &str, _file_type: &str, _stage: &str) {}
    fn record_rows_parsed(&self, _file_type: &str, _rows: u64) {}
    fn record_parse_duration(&self, _file_type: &str, _duration: Duration) {}
}
