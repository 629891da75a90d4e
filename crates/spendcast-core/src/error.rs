//! Error types for Spendcast

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Insufficient history: {days} day(s) observed, at least {required} required")]
    InsufficientHistory { days: usize, required: usize },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Model fit error: {0}")]
    ModelFit(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether the failure is caused by the caller's input rather than by us
    ///
    /// Client errors are not worth retrying with the same input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData(_)
                | Error::InsufficientHistory { .. }
                | Error::MalformedRecord(_)
                | Error::InvalidData(_)
                | Error::Json(_)
                | Error::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
