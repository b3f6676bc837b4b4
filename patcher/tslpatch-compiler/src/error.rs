//! Error types for the patch script compiler.

use std::io;
use thiserror::Error;

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a patch script
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 2DA codec error
    #[error("2DA error: {0}")]
    TwoDA(#[from] kotor_2da::Error),

    /// GFF codec error
    #[error("GFF error: {0}")]
    Gff(#[from] kotor_gff::Error),

    /// TLK codec error
    #[error("TLK error: {0}")]
    Tlk(#[from] kotor_tlk::Error),

    /// SSF codec error
    #[error("SSF error: {0}")]
    Ssf(#[from] kotor_ssf::Error),

    /// File extension does not map to a supported resource kind
    #[error("Unsupported resource: {0}")]
    UnsupportedResource(String),

    /// Resource kind has no binary codec (scripts are plain text)
    #[error("No codec for {0}")]
    NoCodec(String),

    /// Invalid glob pattern while walking a folder
    #[error("Invalid scan pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Create a new UnsupportedResource error
    pub fn unsupported<S: Into<String>>(name: S) -> Self {
        Error::UnsupportedResource(name.into())
    }
}
