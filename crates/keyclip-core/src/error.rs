//! Error types for KeyClip.

use thiserror::Error;

/// Main error type for KeyClip operations.
#[derive(Error, Debug)]
pub enum KeyclipError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for KeyClip operations.
pub type Result<T> = std::result::Result<T, KeyclipError>;
