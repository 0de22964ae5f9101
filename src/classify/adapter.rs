//! Signal adapters: run a classifier and absorb its failures.
//!
//! `try_analyze` returns the classifier outcome as a `Result`. `analyze` is
//! the one place where an [`AdapterError`] becomes a sentinel signal: the
//! `"error"` audio label, or a neutral `(0.0, 0.0)` text signal. The failure
//! is kept on the returned [`Observed`] for reporting, but the signal alone
//! is what the integration policy sees.

use crate::audio::DecodedAudio;
use crate::classify::audio::{AudioClassifier, top_label};
use crate::classify::error::AdapterError;
use crate::classify::text::SentimentAnalyzer;
use crate::error::EmotagError;
use crate::signal::{AudioSignal, TextSignal};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A signal plus the failure it replaced, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Observed<S> {
    pub signal: S,
    pub failure: Option<AdapterError>,
}

impl<S> Observed<S> {
    fn ok(signal: S) -> Self {
        Self {
            signal,
            failure: None,
        }
    }

    /// True when `signal` is a sentinel standing in for a failed call.
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

async fn with_timeout<T, F>(backend: &str, timeout: Duration, call: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| AdapterError::Timeout {
            backend: backend.to_string(),
            timeout,
        })?
}

/// Audio path → [`AudioSignal`].
#[derive(Clone)]
pub struct AudioAdapter {
    classifier: Arc<dyn AudioClassifier>,
    timeout: Duration,
}

impl AudioAdapter {
    pub fn new(classifier: Arc<dyn AudioClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    pub fn backend(&self) -> &str {
        self.classifier.name()
    }

    /// Decode `path`, classify it, and return the top label lower-cased.
    pub async fn try_analyze(&self, path: &Path) -> Result<AudioSignal, AdapterError> {
        let owned = path.to_path_buf();
        let audio = tokio::task::spawn_blocking(move || DecodedAudio::from_path(&owned))
            .await
            .map_err(|e| AdapterError::Decode(format!("decode task panicked: {e}")))?
            .map_err(|e| match e {
                EmotagError::AudioDecode { message } => AdapterError::Decode(message),
                other => AdapterError::Decode(other.to_string()),
            })?;

        tracing::trace!(
            path = %path.display(),
            seconds = audio.duration_secs(),
            source_rate = audio.source_rate,
            source_channels = audio.source_channels,
            "audio decoded"
        );

        let backend = self.classifier.name();
        let predictions =
            with_timeout(backend, self.timeout, self.classifier.classify(&audio)).await?;

        top_label(&predictions)
            .map(AudioSignal::new)
            .ok_or_else(|| AdapterError::invalid_response(backend, "empty prediction list"))
    }

    /// Like [`Self::try_analyze`], with any failure replaced by
    /// [`AudioSignal::error`].
    pub async fn analyze(&self, path: &Path) -> Observed<AudioSignal> {
        match self.try_analyze(path).await {
            Ok(signal) => Observed::ok(signal),
            Err(failure) => {
                tracing::warn!(path = %path.display(), error = %failure, "audio analysis failed");
                Observed {
                    signal: AudioSignal::error(),
                    failure: Some(failure),
                }
            }
        }
    }
}

/// Transcript → [`TextSignal`].
#[derive(Clone)]
pub struct TextAdapter {
    analyzer: Arc<dyn SentimentAnalyzer>,
    timeout: Duration,
}

impl TextAdapter {
    pub fn new(analyzer: Arc<dyn SentimentAnalyzer>, timeout: Duration) -> Self {
        Self { analyzer, timeout }
    }

    pub fn backend(&self) -> &str {
        self.analyzer.name()
    }

    pub async fn try_analyze(&self, text: &str) -> Result<TextSignal, AdapterError> {
        with_timeout(self.analyzer.name(), self.timeout, self.analyzer.analyze(text)).await
    }

    /// Like [`Self::try_analyze`], with any failure replaced by
    /// [`TextSignal::neutral`]. The sentinel is indistinguishable from
    /// neutral text; check [`Observed::is_degraded`] to tell them apart.
    pub async fn analyze(&self, text: &str) -> Observed<TextSignal> {
        match self.try_analyze(text).await {
            Ok(signal) => Observed::ok(signal),
            Err(failure) => {
                tracing::warn!(error = %failure, "text analysis failed");
                Observed {
                    signal: TextSignal::neutral(),
                    failure: Some(failure),
                }
            }
        }
    }
}
