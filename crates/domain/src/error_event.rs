//! Structured error events published by every service on the error topic.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default topic for error events
pub const DEFAULT_ERROR_TOPIC: &str = "error.frolf.bot";

/// Separator between context fragments
pub const CONTEXT_SEPARATOR: &str = " | ";

/// Placeholder recorded when an error or its call site is not known
pub const UNKNOWN: &str = "unknown";

/// An error observed by a service, with enough context to correlate it with
/// the transaction that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEventPayload {
    pub correlation_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// User context fragments followed by the reporting call site, joined by `" | "`
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorEventPayload {
    /// Event stamped with the current time and no context
    pub fn new(correlation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            message: message.into(),
            error: None,
            timestamp: Utc::now(),
            context: String::new(),
            error_type: None,
        }
    }

    /// Attach the underlying error text and its type name
    pub fn with_error(mut self, error: impl Into<String>, error_type: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.error_type = Some(error_type.into());
        self
    }

    /// Join context fragments, skipping empty ones
    pub fn with_context<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.context = join_context(fragments);
        self
    }
}

/// Join non-empty context fragments with `" | "`
pub fn join_context<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter(|f| !f.as_ref().is_empty())
        .map(|f| f.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_context_skips_empty() {
        assert_eq!(join_context(["ctx", "", "main (src/main.rs:3)"]), "ctx | main (src/main.rs:3)");
        assert_eq!(join_context(Vec::<String>::new()), "");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let event = ErrorEventPayload::new("cid", "boom");
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("error_type").is_none());
        assert_eq!(json["correlation_id"], "cid");

        let event = event.with_error("x", "io::Error").with_context(["a", "b"]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["error"], "x");
        assert_eq!(json["context"], "a | b");
    }
}
