//! Error types for BlobDB
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BlobError
pub type Result<T> = std::result::Result<T, BlobError>;

/// Unified error type for BlobDB operations
#[derive(Debug, Error)]
pub enum BlobError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Directory/file creation, append, flush, sync or read failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// Checksum mismatch, malformed record or malformed index record
    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// The requested operation or configuration is not available
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BlobError {
    /// Shorthand for building a `Corruption` error
    pub(crate) fn corruption(msg: impl Into<String>) -> Self {
        BlobError::Corruption(msg.into())
    }

    /// True if this error reports corrupted on-disk or index data
    pub fn is_corruption(&self) -> bool {
        matches!(self, BlobError::Corruption(_))
    }

    /// True if this error reports a missing key
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound)
    }
}
