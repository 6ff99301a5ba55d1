//! Error types for event contract construction.

/// Configuration errors raised while assembling the event registry.
///
/// These are programming errors in the contract definitions and are fatal at
/// startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The same topic was registered by two entries
    #[error("registry: duplicate topic {0}")]
    DuplicateTopic(String),

    /// A topic does not follow `<domain>.<event>.v1`
    #[error("registry: invalid topic name {0}")]
    InvalidTopic(String),
}
