//! Error types for the box predictor

use crate::model::ModelError;
use thiserror::Error;

/// Errors that can occur while encoding a request or running a prediction
#[derive(Error, Debug)]
pub enum PredictorError {
    /// Request carried a different number of categories and quantities
    #[error("categories and quantities must have the same length")]
    LengthMismatch { categories: usize, quantities: usize },

    /// Model loading or invocation failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PredictorError {
    /// True for malformed requests, as opposed to model or environment failures
    pub fn is_validation(&self) -> bool {
        matches!(self, PredictorError::LengthMismatch { .. })
    }
}

/// Result type for box predictor operations
pub type Result<T> = std::result::Result<T, PredictorError>;
