//! Error types for estimators

use rustml_tsgen::TsgenError;
use thiserror::Error;

/// Result type for estimator operations
pub type SeqModelResult<T> = Result<T, SeqModelError>;

#[derive(Error, Debug)]
pub enum SeqModelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("This {0} has not been fitted yet")]
    NotFitted(&'static str),

    #[error("kind: {kind} is not an available model for type: {estimator}")]
    UnknownModelKind { kind: String, estimator: String },

    #[error("Invalid model spec: {0}")]
    InvalidSpec(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Timeseries error: {0}")]
    Timeseries(#[from] TsgenError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
