//! Error types for cordscope.
//!
//! Data-quality problems (bad dates, missing columns, empty input) never surface here;
//! they become `None` fields or empty tables. These variants cover structural failures
//! at the edges: reading files, parsing configuration, writing exports.

use thiserror::Error;

/// Main error type for cordscope operations.
#[derive(Debug, Error)]
pub enum CordError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `CordError`
pub type Result<T> = std::result::Result<T, CordError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a validation error message
    fn ok_or_invalid(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_invalid(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| CordError::Validation(msg.to_string()))
    }
}
