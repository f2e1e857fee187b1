//! Error types for IDE file loading.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for IDE operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading an IDE file.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),

    /// IO error while reading the input.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The CSV tokenizer rejected a line.
    #[error("invalid CSV at line {line}: {message}")]
    Csv {
        /// 1-based line number in the original file.
        line: usize,
        /// Tokenizer message.
        message: String,
    },

    /// No header row remained after skipping comments and blank lines.
    #[error("IDE file has no header row")]
    MissingHeader,

    /// A record lacks a field every record must carry.
    #[error("record at line {line} is missing required field {field}")]
    MissingField {
        /// 1-based line number of the record.
        line: usize,
        /// Name of the missing field.
        field: String,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a missing-field error.
    pub fn missing_field(line: usize, field: impl Into<String>) -> Self {
        Self::MissingField {
            line,
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = Error::missing_field(7, "mlepSmsPersonId");
        let display = err.to_string();
        assert!(display.contains("line 7"));
        assert!(display.contains("mlepSmsPersonId"));
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound(PathBuf::from("ide.csv"));
        assert_eq!(err.to_string(), "CSV file not found: ide.csv");
    }
}
