//! Generator errors

use frolf_events_domain::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Failures while generating or reading contract documentation
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("io: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A channel payload references a schema absent from `components.schemas`
    #[error("schema: {topic} references missing schema {name}")]
    MissingSchema { topic: String, name: String },
}

impl CodegenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
