//! Model errors.

use thiserror::Error;

/// Errors that can occur while splitting, fitting or predicting
#[derive(Debug, Error)]
pub enum ModelError {
    /// Not enough rows to split or fit
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Required number of rows
        required: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// NaN or infinite input
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// Linear system could not be solved
    #[error("Matrix is singular or not positive definite")]
    SingularMatrix,

    /// Predict called before fit
    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
