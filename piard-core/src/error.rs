//! Error types for the servo model

use thiserror::Error;

use crate::traits::DriverError;

pub type ServoResult<T> = Result<T, ServoError>;

/// Configuration errors. Always fatal at construction time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Parameter does not match the scalar/dense/sparse/remap forms
    #[error("Invalid parameter shape: {0}")]
    InvalidShape(String),

    /// Non-numeric (or boolean) value where a number is required
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Angle bounds do not fit inside the servo range
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Zero-width conversion range
    #[error("Degenerate range: {0}")]
    DegenerateRange(String),
}

/// Errors raised by servo array and controller operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Bulk operation received the wrong number of entries
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Servo index {index} out of range (array has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ServoError {
    pub(crate) fn check_len(expected: usize, actual: usize) -> ServoResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(ServoError::LengthMismatch { expected, actual })
        }
    }
}
