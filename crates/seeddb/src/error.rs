//! Error types for seeddb

use thiserror::Error;

/// Result type alias for seeddb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for resolution operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller-supplied identifier is malformed; no I/O was performed
    #[error("Invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// Server answered with a non-success status other than 404
    #[error("Got status {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Connection or I/O failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request did not complete within the transport timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Successful response that lacks the expected data
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client settings cannot be turned into a working transport
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether repeating the same call later might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout(_) => true,
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            Error::InvalidIdentifier(_)
            | Error::MissingData(_)
            | Error::Decode(_)
            | Error::Config(_)
            | Error::Cancelled => false,
        }
    }

    /// Whether the error came from the caller cancelling the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<quick_xml::de::DeError> for Error {
    fn from(err: quick_xml::de::DeError) -> Self {
        Error::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classes() {
        assert!(Error::Transport("reset".into()).is_retryable());
        assert!(Error::Timeout("slow".into()).is_retryable());
        assert!(Error::Status { status: 503, url: "u".into() }.is_retryable());
        assert!(Error::Status { status: 429, url: "u".into() }.is_retryable());
        assert!(!Error::Status { status: 400, url: "u".into() }.is_retryable());
        assert!(!Error::InvalidIdentifier("x".into()).is_retryable());
        assert!(!Error::MissingData("id".into()).is_retryable());
        assert!(!Error::Config("bad header".into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::Status {
            status: 500,
            url: "https://example.org/ws".into(),
        };
        assert_eq!(err.to_string(), "Got status 500 for https://example.org/ws");
        assert!(Error::Cancelled.is_cancelled());
    }
}
