//! Error types for tapedeck

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TapedeckError {
    #[error("Invalid edit parameters: {0}")]
    InvalidParameters(String),
    #[error("Invalid sample buffer: {0}")]
    InvalidBuffer(String),
    #[error("No sample buffer attached")]
    EmptyBuffer,
    #[error("Encoding failure: {0}")]
    EncodingFailure(String),
    #[error("Export cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TapedeckError>;
