//! Encoder errors

use thiserror::Error;

use piard_core::DriverError;

pub type EncodeResult<T> = Result<T, EncodeError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Delimiter or payload text has no representation in the encoding
    #[error("'{text}' cannot be encoded as {encoding}")]
    Unrepresentable { text: String, encoding: &'static str },

    /// Two-byte entries carry an 11-bit index
    #[error("Servo index {index} does not fit in 11 bits")]
    IndexOverflow { index: usize },
}

impl From<EncodeError> for DriverError {
    fn from(e: EncodeError) -> Self {
        DriverError::Encode(e.to_string())
    }
}
