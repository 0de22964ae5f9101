//! emotag - Emotion tagging for Japanese speech datasets
//!
//! Labels each row of a metadata table by combining a speech emotion
//! classifier with a text sentiment score.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod batch;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod output;
pub mod policy;
pub mod signal;
pub mod table;

// Composition root
pub mod app;

// Classifier seams
pub use classify::{AudioAdapter, AudioClassifier, Observed, SentimentAnalyzer, TextAdapter};

// Driver
pub use batch::{BatchDriver, BatchSummary, RowOutcome, RowReport};

// Decision
pub use policy::{Decision, FinalLabel, decide, integrate};
pub use signal::{AudioSignal, TextSignal};

// Error handling
pub use error::{EmotagError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
