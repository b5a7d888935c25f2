//! Error types for eisbach-core.
//!
//! Errors in this crate are produced by the transport and cache layers. The
//! data sources built on top of them never return these errors to callers:
//! a failed fetch is recorded as a message in the source's
//! [`FetchState`](crate::FetchState) and the previously held value is kept.
//!
//! # Error classes
//!
//! | Error Type | Cause | Recovery |
//! |------------|-------|----------|
//! | [`Error::Transport`] | Connection reset, invalid response | Fetch again later |
//! | [`Error::Unreachable`] | Connection refused or DNS failure | Fetch again later |
//! | [`Error::Status`] | Backend answered with a non-2xx status | Fetch again later |
//! | [`Error::Parse`] | Malformed JSON or a missing field | Do not retry, report |
//! | [`Error::Timeout`] | Request exceeded the client timeout | Fetch again later |
//! | [`Error::NotFound`] | A requested resource does not exist | Do not retry |
//! | [`Error::Cache`] | Local cache could not be read or written | Ignored by data sources |
//! | [`Error::InvalidConfig`] | Bad base URL or settings | Fix configuration |

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the tracker backend.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The HTTP request could not be completed.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend could not be reached.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with a non-success status code.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The payload could not be decoded.
    #[error("Invalid data: {0}")]
    Parse(String),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// A resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local cache I/O failed.
    #[error("Cache error: {0}")]
    Cache(#[from] std::io::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<eisbach_types::ParseError> for Error {
    fn from(err: eisbach_types::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Result type alias using eisbach-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
