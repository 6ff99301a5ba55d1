//! Infrastructure layer for frolf bot services
//!
//! This crate provides:
//! - The event bus abstraction plus an in-process implementation
//! - An error reporter publishing structured error events
//! - OpenTelemetry metric recorders and a message tracing middleware
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use frolf_events_common::ErrorReporterConfig;
//! use frolf_events_infrastructure::{report_error, ErrorReporter, InMemoryEventBus};
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let reporter = ErrorReporter::new(bus, ErrorReporterConfig::default())?;
//!
//! if let Err(err) = load_round().await {
//!     report_error!(reporter, "cid-1", "failed to load round", &err, "round lookup").await;
//! }
//! ```

pub mod error_reporter;
pub mod messaging;
pub mod observability;

// Re-export commonly used types
pub use error_reporter::{sanitize_sensitive_text, CallSite, ErrorReporter};
pub use messaging::{EventBus, InMemoryBusConfig, InMemoryEventBus, Message, MessageStream};
pub use observability::metrics::{
    ClubMetrics, DiscordMetrics, ErrorSnapshot, ErrorStats, ImporterMetrics, NoopClubMetrics,
    NoopDiscordMetrics, NoopImporterMetrics, NoopRegistryMetrics, OtelClubMetrics, OtelDiscordMetrics,
    OtelImporterMetrics, OtelRegistryMetrics, RegistryMetrics,
};
pub use observability::tracing::TracingMiddleware;

// Re-export result and error types
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure-level errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Messaging errors
    #[error("messaging: {0}")]
    Messaging(String),

    /// The bus no longer accepts publishes or subscriptions
    #[error("messaging: bus closed")]
    BusClosed,

    /// Serialization/deserialization errors
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Messaging(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(Error::Messaging("timeout".to_string()).is_retryable());
        assert!(!Error::BusClosed.is_retryable());
        assert!(!Error::Configuration("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::BusClosed.to_string(), "messaging: bus closed");
        assert_eq!(
            Error::Configuration("error topic is empty".to_string()).to_string(),
            "configuration: error topic is empty"
        );
    }
}
