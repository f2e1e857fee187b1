//! Error types for reconciliation and sinks.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or emitting a change set.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid options or schema tables.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A synthesized account name already belongs to another account.
    #[error("cannot create user {username} for {key}: username already exists")]
    Collision {
        /// The synthesized account name.
        username: String,
        /// Identity key of the source record.
        key: String,
    },

    /// A source record is unusable.
    #[error(transparent)]
    Record(#[from] ide::Error),

    /// IO error while writing a sink file.
    #[error("IO error at {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// CSV serialization error.
    #[error("failed to write {path}: {source}")]
    Csv {
        /// File being written.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a CSV error with path context.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
