use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AcquisitionError {
    #[error("Missing input: {0}")]
    NullInput(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("No signal found")]
    NoResult,
}

pub type Result<T> = std::result::Result<T, AcquisitionError>;
