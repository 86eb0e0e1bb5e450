//! Error types for workflow definition loading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for definition operations.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Errors that can occur while reading, parsing or validating workflow documents.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Failed to read workflow document {origin}: {source}")]
    Read {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed workflow document {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Invalid workflow '{workflow_id}' in {origin}: {}", .errors.join("; "))]
    Validation {
        origin: String,
        workflow_id: String,
        errors: Vec<String>,
    },

    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<DefinitionError>,
    },
}

impl DefinitionError {
    /// The file a directory load stopped at, if this error came from one.
    pub fn failed_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Load { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The innermost error, unwrapping any `Load` context.
    pub fn root(&self) -> &DefinitionError {
        match self {
            Self::Load { source, .. } => source.root(),
            other => other,
        }
    }
}
