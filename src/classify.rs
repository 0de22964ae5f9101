//! Classifier backends and the adapters that turn their output into signals.

pub mod adapter;
pub mod audio;
pub mod error;
pub mod text;

pub use adapter::{AudioAdapter, Observed, TextAdapter};
pub use audio::{AudioClassifier, AudioPrediction};
pub use error::AdapterError;
pub use text::SentimentAnalyzer;
