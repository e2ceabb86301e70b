//! Error types for Legible operations.
//!
//! This module defines the main error type [`LegibleError`]. The tree
//! transformations (extraction, sanitization) are total and never return
//! errors; everything here belongs to the fetch and record-store edges of
//! the pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for pipeline operations.
///
/// # Example
///
/// ```rust
/// use legible_core::{LegibleError, Result};
///
/// fn require_scheme(url: &str) -> Result<()> {
///     if !url.contains("://") {
///         return Err(LegibleError::InvalidUrl("missing scheme".to_string()));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum LegibleError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures, connection issues, and other
    /// transport-level problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or is malformed. The pipeline
    /// reports this without attempting a network call.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with a non-200 status.
    ///
    /// The pipeline records this verbatim as the record's failure message.
    #[error("{status} {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    /// Record lookup failed.
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    /// Storage-layer failure while loading or updating a record.
    #[error("Record store error: {0}")]
    StoreError(String),
}

/// Result type alias for LegibleError.
pub type Result<T> = std::result::Result<T, LegibleError>;
