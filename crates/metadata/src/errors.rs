//! Error types for the metadata recorder

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or persisting a model record
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Record inputs are inconsistent (e.g. feature names vs importances)
    #[error("Metadata validation failed: {0}")]
    Validation(String),

    /// Filesystem failure while writing the record
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MetadataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Kind of the underlying I/O error, if this is an I/O failure
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;
