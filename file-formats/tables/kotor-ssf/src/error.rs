//! Error types for the SSF codec.

use std::io;
use thiserror::Error;

/// Result type alias for SSF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading or writing a sound set
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported signature or version
    #[error("Invalid SSF header: {0}")]
    InvalidHeader(String),

    /// Sound table offset points outside the file
    #[error("Invalid SSF table offset: {0}")]
    InvalidOffset(u32),

    /// Unknown sound slot name
    #[error("Unknown sound slot: {0}")]
    UnknownSlot(String),
}
