//! Error types for the TLK codec.

use std::io;
use thiserror::Error;

/// Result type alias for TLK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading or writing a talk table
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported signature or version
    #[error("Invalid TLK header: {0}")]
    InvalidHeader(String),

    /// An entry points outside the string data
    #[error("Invalid TLK entry {index}: {reason}")]
    InvalidEntry {
        /// Entry index
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// The table does not fit the 32-bit layout
    #[error("TLK capacity exceeded: {0}")]
    CapacityExceeded(String),
}
