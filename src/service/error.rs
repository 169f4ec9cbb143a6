//! Error types for the document service client.
//!
//! [`ServiceError`] separates HTTP-level rejections from transport failures
//! and from bodies that arrived but could not be decoded.

use thiserror::Error;

/// Failures while talking to the upload/OCR/analysis backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backend answered with a non-success status.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The body arrived but did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Connection, DNS or timeout failure below HTTP.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
