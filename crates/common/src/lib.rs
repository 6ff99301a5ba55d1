//! Common utilities shared by frolf bot event tooling.
//!
//! This crate provides:
//! - Configuration management (files plus `FROLF_*` environment overrides)
//! - Structured logging setup

pub mod config;
pub mod telemetry;

// Re-export commonly used types
pub use config::{ContractsConfig, ErrorReporterConfig, ReportLevel, TelemetryConfig};
pub use telemetry::init_tracing;

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
