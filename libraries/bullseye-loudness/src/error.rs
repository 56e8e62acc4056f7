//! Error types for meter configuration

use thiserror::Error;

/// Result type for meter configuration
pub type Result<T> = std::result::Result<T, MeterError>;

/// Errors reported by the fallible configuration entry points
///
/// The per-sample path never produces these; invalid samples are sanitized in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeterError {
    /// Sample rate outside the supported range
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 1000000)")]
    InvalidSampleRate(f64),

    /// Content type index outside the known categories
    #[error("Invalid content type: {0} (must be 0-2)")]
    InvalidContentType(i64),

    /// Content type name that matches no category
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
}
