//! Export pipeline errors.
//!
//! Every stage of a temperature export fails with its own variant so the
//! HTTP layer can log exactly where a run broke down.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a single export run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// The portal page could not be loaded to establish a session.
    #[error("Failed to open portal session: {0}")]
    Session(String),

    /// The export job was rejected or the response carried no token.
    #[error("Failed to enqueue export: {0}")]
    Enqueue(String),

    /// The artifact never became ready.
    #[error("Download not ready after {attempts} attempts ({backoff:?} apart)")]
    NotReady {
        /// Number of readiness checks issued.
        attempts: u32,
        /// Wait between checks.
        backoff: Duration,
    },

    /// The artifact could not be downloaded.
    #[error("Failed to download export: {0}")]
    Download(String),

    /// The archive holds no `.csv` entry.
    #[error("No CSV file found in the archive (entries: {})", .entries.join(", "))]
    MissingCsv {
        /// Names of the entries that were present.
        entries: Vec<String>,
    },

    /// The archive could not be opened.
    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The tabular payload could not be parsed.
    #[error("Failed to parse export: {0}")]
    Parse(String),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
