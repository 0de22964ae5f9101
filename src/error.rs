//! Error types for emotag.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmotagError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Metadata table errors
    #[error("Input table not found at {path}")]
    InputTableNotFound { path: String },

    #[error("Input table is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Malformed table row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("Table error: {0}")]
    Table(#[from] csv::Error),

    // Audio decoding errors
    #[error("Audio decode failed: {message}")]
    AudioDecode { message: String },

    // Classifier backend errors
    #[error("Classifier backend '{backend}' unavailable: {message}")]
    BackendUnavailable { backend: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, EmotagError>;
