//! Error types for data parsing in eisbach-types.

use thiserror::Error;

/// Errors that can occur when normalising payloads from the backend or the
/// data portal.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload did not have the expected shape.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A localized date/time string could not be converted to an instant.
    #[error("Invalid timestamp '{input}': expected DD.MM.YYYY HH:MM[:SS]")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
    },

    /// A decimal value (possibly using a decimal comma) could not be read.
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
}

/// Result type alias using eisbach-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
