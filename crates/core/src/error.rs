//! Error types for localkrige

use thiserror::Error;

/// Main error type for localkrige operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    /// Unrecognized identifier or unusable setting detected at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Two sequences that must be index-aligned have different lengths.
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Model is not trained; call fit first")]
    NotTrained,

    #[error("Requested {requested} neighbors but only {available} coordinates are available")]
    NeighborCount { requested: usize, available: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

/// Result type alias for localkrige operations
pub type Result<T> = std::result::Result<T, Error>;
