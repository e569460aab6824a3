//! # Error Types
//!
//! This module defines error types used throughout the mememe library.
//!
//! Every error is recoverable by user action: nothing here is fatal to the
//! process, and an operation that fails leaves the composition untouched.

use thiserror::Error;

/// Main error type for mememe operations
#[derive(Debug, Error)]
pub enum MememeError {
    /// Rejected user action (no template, no text, layer limit)
    #[error("{0}")]
    UserInput(String),

    /// Template image or catalog could not be loaded
    #[error("Load error: {0}")]
    ResourceLoad(String),

    /// Export attempted before an image was composed
    #[error("{0}")]
    RenderingPrecondition(String),

    /// No usable font file
    #[error("Font error: {0}")]
    Font(String),

    /// Malformed payload from the studio
    #[error("Invalid builder payload: {0}")]
    Payload(String),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MememeError {
    /// Whether the error should be shown to the user as a blocking alert
    /// rather than reported as a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            MememeError::UserInput(_) | MememeError::RenderingPrecondition(_)
        )
    }
}
