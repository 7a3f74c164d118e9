//! Error types for badgeboard

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, processing or writing batches
#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("No '{column}' header row found in the first {probed} rows of {file}")]
    MissingHeader {
        file: String,
        column: String,
        probed: usize,
    },

    #[error("Unknown badge label: {0}")]
    UnknownLabel(String),

    #[error("Malformed batch filename: {0}")]
    MalformedFilename(String),

    #[error("Batch {current} arrived after batch {previous}; batches must be sorted ascending")]
    OutOfOrderBatch { previous: u32, current: u32 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BadgeError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BadgeError::Io {
            path: path.into(),
            source,
        }
    }
}
