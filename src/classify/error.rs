//! Errors raised at the classifier adapter boundary.
//!
//! These never leave the adapters: [`crate::classify::adapter`] turns every
//! one of them into a sentinel signal.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("audio decode failed: {0}")]
    Decode(String),

    #[error("{backend} request failed: {message}")]
    Backend { backend: String, message: String },

    #[error("{backend} timed out after {timeout:?}")]
    Timeout { backend: String, timeout: Duration },

    #[error("{backend} returned an unusable response: {message}")]
    InvalidResponse { backend: String, message: String },
}

impl AdapterError {
    pub fn backend(backend: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_response(backend: &str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            backend: backend.to_string(),
            message: message.into(),
        }
    }
}
