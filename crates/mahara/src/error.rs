//! Error types for Mahara web-service operations.
//!
//! Errors are categorized so the command line can print actionable advice
//! alongside the message.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for Mahara operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Mahara errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// OAuth credentials rejected or missing.
    Auth,
    /// The web service reported a failure.
    Remote,
    /// Unexpected response format.
    Format,
    /// Invalid options or input data.
    Input,
    /// Synthesized account name already taken.
    Collision,
    /// Permission denied on a local file.
    Permission,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "OAuth authentication problem",
            Self::Remote => "Mahara web service error",
            Self::Format => "Invalid response format",
            Self::Input => "Invalid input",
            Self::Collision => "Username collision",
            Self::Permission => "Permission denied",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check the Mahara URL and your network connection, then try again",
            Self::Auth => "Remove the stored OAuth token file and run again to re-authorize",
            Self::Remote => "Check the web service configuration and the Mahara error log",
            Self::Format => "Check that the URL points at a Mahara site with web services enabled",
            Self::Input => "Check the IDE file and the command line options",
            Self::Collision => {
                "Rename or relink the existing account before creating the new one"
            }
            Self::Permission => "Check file permissions on the token file and its directory",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur talking to Mahara.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The web service rejected the OAuth credentials.
    #[error("OAuth authentication problem ({exception}): {message}")]
    Auth {
        /// Exception class reported by Mahara.
        exception: String,
        /// Error message.
        message: String,
        /// Token file the rejected credentials came from.
        token_file: Option<PathBuf>,
    },

    /// The web service raised an exception.
    #[error("web service error ({exception}): {message}")]
    Remote {
        /// Exception class reported by Mahara.
        exception: String,
        /// Error message.
        message: String,
    },

    /// Response could not be understood.
    #[error("invalid web service response: {0}")]
    InvalidResponse(String),

    /// The OAuth handshake failed.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// The stored token file is malformed.
    #[error("invalid token file {path}: {message}")]
    Credentials {
        /// Token file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Reconciliation failed.
    #[error(transparent)]
    Reconcile(#[from] reconcile::Error),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { .. } => ErrorCategory::Network,
            Error::Auth { .. } | Error::Authorization(_) | Error::Credentials { .. } => {
                ErrorCategory::Auth
            }
            Error::Remote { .. } => ErrorCategory::Remote,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Io { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    ErrorCategory::Permission
                } else {
                    ErrorCategory::Other
                }
            }
            Error::Reconcile(reconcile::Error::Collision { .. }) => ErrorCategory::Collision,
            Error::Reconcile(_) => ErrorCategory::Input,
        }
    }

    /// Advice for this error, naming the token file when one is involved.
    #[must_use]
    pub fn advice(&self) -> String {
        let token_file = match self {
            Error::Auth {
                token_file: Some(path),
                ..
            }
            | Error::Credentials { path, .. } => path,
            _ => return self.category().advice().to_string(),
        };
        format!(
            "Remove the stored OAuth token file {} and run again to re-authorize",
            token_file.display()
        )
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
