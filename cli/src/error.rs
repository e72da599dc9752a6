use chipsync_core::AcquisitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample rate mismatch: config expects {expected} Hz, file has {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
}

pub type Result<T> = std::result::Result<T, CliError>;
