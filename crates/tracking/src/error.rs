//! Error types for telemetry loading.

use thiserror::Error;

/// Errors that can occur while loading bear tracks.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// The CSV file could not be opened or read.
    #[error("Failed to read tracking file: {0}")]
    ReadFailed(String),

    /// A row could not be parsed.
    #[error("Invalid CSV record at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// A required column is absent from the header.
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    /// A timestamp matched none of the accepted formats.
    #[error("Invalid timestamp '{value}' at line {line}")]
    InvalidTimestamp { line: u64, value: String },

    /// Reprojection of a fix failed.
    #[error("Projection error: {0}")]
    Projection(#[from] projection::ProjectionError),

    /// The file held no observations.
    #[error("No observations in {0}")]
    Empty(String),
}

impl TrackingError {
    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }
}

impl From<csv::Error> for TrackingError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        Self::Csv {
            line,
            message: err.to_string(),
        }
    }
}

/// Result type alias for tracking operations.
pub type Result<T> = std::result::Result<T, TrackingError>;
