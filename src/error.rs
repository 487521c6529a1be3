//! Error taxonomy for staged edits and workspace file access

use std::io;

use thiserror::Error;

/// Errors produced by the diff engine, the file gateway and the edit ledger
#[derive(Debug, Error)]
pub enum EditError {
    /// Source file of a delete/rename (or a snapshot) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Path is absolute or normalizes outside the workspace root
    #[error("path '{0}' escapes the workspace root")]
    PathEscape(String),

    /// Content is missing or does not match what an operation expects
    #[error("invalid content for '{path}': {reason}")]
    InvalidContent { path: String, reason: String },

    /// Edit is missing data required by its operation type
    #[error("invalid operation for '{path}': {reason}")]
    InvalidOperation { path: String, reason: String },

    /// Underlying filesystem failure
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl EditError {
    pub fn invalid_content(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidContent {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_operation(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error, mapping `io::ErrorKind::NotFound` to [`EditError::NotFound`]
    pub fn io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience alias for results in this crate
pub type Result<T> = std::result::Result<T, EditError>;
