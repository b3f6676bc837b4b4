//! Error types for the GFF codec.

use std::io;
use thiserror::Error;

/// Result type alias for GFF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading or writing a GFF resource
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported signature or version
    #[error("Invalid GFF header: {0}")]
    InvalidHeader(String),

    /// Structural problem inside the file
    #[error("Invalid GFF format: {0}")]
    InvalidFormat(String),

    /// Unknown field type id
    #[error("Unknown GFF field type: {0}")]
    UnknownFieldType(u32),

    /// Struct nesting deeper than the reader allows
    #[error("GFF struct nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    /// Label longer than 16 bytes
    #[error("GFF label too long: {0}")]
    LabelTooLong(String),
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }
}
