//! Observability plumbing: OpenTelemetry metric recorders and message tracing.
//!
//! Every recorder comes as a trait with an OpenTelemetry-backed
//! implementation and a no-op one for tests and services running without a
//! metrics pipeline.

pub mod metrics;
pub mod tracing;
