//! Error types for the cleanse library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cleanse operations.
#[derive(Debug, Error)]
pub enum CleanseError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no header to read.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A record does not have one field per column.
    #[error("Record on line {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A column required by a stage is not part of the schema.
    #[error("Column '{column}' required by {stage} is missing")]
    MissingColumn { column: String, stage: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid delimiter specified.
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CleanseError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CleanseError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for cleanse operations.
pub type Result<T> = std::result::Result<T, CleanseError>;
