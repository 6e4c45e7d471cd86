// src/math/error.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Query out of bounds on axis {axis}: {value} is outside [0, 1]")]
    OutOfBoundsQuery { axis: usize, value: f64 },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Operation '{operation}' does not support {dimensions} dimensions")]
    UnsupportedDimensions {
        operation: &'static str,
        dimensions: usize,
    },
}

pub type MathResult<T> = Result<T, MathError>;
