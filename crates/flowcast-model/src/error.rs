//! Error types for artifact loading and numeric evaluation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for model and scaler operations.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checksum mismatch for {path}: expected {expected}, found {found}")]
    Checksum {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("unsupported artifact format version: {0}")]
    Version(String),

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    Shape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("{0} produced a non-finite value")]
    NonFinite(&'static str),
}
