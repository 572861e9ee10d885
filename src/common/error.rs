//! Error types for taskherd

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Namespace Errors ===
    #[error("Node already exists: {0}")]
    NodeExists(String),

    #[error("No node at {0}")]
    NoNode(String),

    #[error("Version mismatch on {path}: expected {expected}, actual {actual}")]
    BadVersion {
        path: String,
        expected: i64,
        actual: i64,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // === Session Errors ===
    #[error("Connection lost during {0}")]
    ConnectionLoss(String),

    #[error("Session expired")]
    SessionExpired,

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is the outcome of the failed operation unknown?
    ///
    /// An ambiguous failure means the connection dropped before an
    /// acknowledgment arrived; the operation may have committed
    /// server-side. Callers resolve these by retrying or re-reading,
    /// never by assuming failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Error::ConnectionLoss(_))
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguity_classification() {
        assert!(Error::ConnectionLoss("create /master".into()).is_ambiguous());

        // Logical and environmental failures are definitive.
        assert!(!Error::NodeExists("/master".into()).is_ambiguous());
        assert!(!Error::NoNode("/master".into()).is_ambiguous());
        assert!(!Error::SessionExpired.is_ambiguous());
        assert!(!Error::InvalidPath("no-slash".into()).is_ambiguous());
    }
}
