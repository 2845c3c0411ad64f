//! Error types for extraction.

use icmd_core::UnitError;
use icmd_document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to load data: {0}")]
    DataLoad(#[from] DocumentError),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Parameter not found in model '{model}': {name}")]
    ParameterNotFound { model: String, name: String },

    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(#[from] UnitError),

    #[error("Model '{model}' has no aligned step ({dropped} steps dropped)")]
    EmptyAlignment { model: String, dropped: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
