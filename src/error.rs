//! Error types for the finsight crate

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum FinsightError {
    /// Invalid run configuration (missing dataset, unset target, ...).
    /// Surfaced before training starts; training never begins.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// Failure inside the training loop; carried into `TrainingState::Failed`.
    #[error("Training error: {0}")]
    Training(String),

    /// Operation not allowed in the current lifecycle state
    /// (e.g. `start` while Running, `reset` while Running).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model is not fitted")]
    ModelNotFitted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, FinsightError>;
