//! Error types for OxiFlate operations.
//!
//! Compression accepts every byte sequence, so the only failure a caller can
//! observe comes from the output sink. Broken internal invariants are bugs
//! and panic instead of surfacing here.

use std::io;
use thiserror::Error;

/// The main error type for OxiFlate operations.
#[derive(Debug, Error)]
pub enum OxiFlateError {
    /// I/O error from the underlying writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for OxiFlate operations.
pub type Result<T> = std::result::Result<T, OxiFlateError>;

impl From<OxiFlateError> for io::Error {
    fn from(err: OxiFlateError) -> Self {
        match err {
            OxiFlateError::Io(inner) => inner,
        }
    }
}
