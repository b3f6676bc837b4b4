//! Error types for the 2DA codec.

use std::io;
use thiserror::Error;

/// Result type alias for 2DA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading or writing a 2DA table
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a supported 2DA header
    #[error("Invalid 2DA header: {0}")]
    InvalidHeader(String),

    /// Structural problem in the table body
    #[error("Invalid 2DA data: {0}")]
    InvalidData(String),

    /// The table is too large to be stored in the binary format
    #[error("2DA capacity exceeded: {0}")]
    CapacityExceeded(String),
}

impl Error {
    /// Create a new InvalidData error
    pub fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Error::InvalidData(msg.into())
    }
}
