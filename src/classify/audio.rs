//! Audio emotion classifiers.
//!
//! The classifier itself is a black box: it receives decoded 16kHz mono audio
//! and returns ranked emotion predictions. Backends are swappable behind
//! [`AudioClassifier`].

use crate::audio::DecodedAudio;
use crate::classify::error::AdapterError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One ranked output of an audio classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioPrediction {
    pub label: String,
    #[serde(default = "full_confidence")]
    pub score: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl AudioPrediction {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
        }
    }
}

/// Trait for audio emotion classification.
///
/// Implementations must be stateless from the caller's side: one instance is
/// shared by every row of a batch.
#[async_trait]
pub trait AudioClassifier: Send + Sync {
    /// Classify a decoded recording. Predictions may come in any order.
    async fn classify(&self, audio: &DecodedAudio) -> Result<Vec<AudioPrediction>, AdapterError>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Highest-scoring label. The first one wins on ties.
pub fn top_label(predictions: &[AudioPrediction]) -> Option<&str> {
    let mut best: Option<&AudioPrediction> = None;
    for prediction in predictions {
        if best.is_none_or(|b| prediction.score > b.score) {
            best = Some(prediction);
        }
    }
    best.map(|p| p.label.as_str())
}

/// Parse an audio-classification response body.
///
/// Accepts the Hugging Face Inference API shape (`[{label, score}, ...]`),
/// the batched variant (`[[{label, score}, ...]]`), and a bare
/// `{"label": ...}` object. An `{"error": ...}` body is reported as such.
pub fn parse_predictions(backend: &str, body: &str) -> Result<Vec<AudioPrediction>, AdapterError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AdapterError::invalid_response(backend, format!("not JSON: {e}")))?;

    if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
        return Err(AdapterError::invalid_response(backend, error));
    }

    let value = match value {
        serde_json::Value::Array(items)
            if items.len() == 1 && items.first().is_some_and(|i| i.is_array()) =>
        {
            items.into_iter().next().unwrap_or_default()
        }
        serde_json::Value::Object(_) => serde_json::Value::Array(vec![value]),
        other => other,
    };

    let predictions: Vec<AudioPrediction> = serde_json::from_value(value)
        .map_err(|e| AdapterError::invalid_response(backend, format!("unexpected shape: {e}")))?;
    if predictions.is_empty() {
        return Err(AdapterError::invalid_response(backend, "empty prediction list"));
    }
    Ok(predictions)
}

/// Audio classifier served over HTTP.
///
/// POSTs the canonical 16kHz mono WAV as `audio/wav` and expects ranked
/// predictions back.
#[cfg(feature = "http")]
pub struct HttpAudioClassifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

#[cfg(feature = "http")]
impl HttpAudioClassifier {
    const NAME: &'static str = "http-audio";

    /// Build from config, reading the bearer token from the configured
    /// environment variable if it is set.
    pub fn new(config: &crate::config::AudioConfig) -> crate::error::Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/');
        let url = if config.model.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}/{}", endpoint, config.model)
        };
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty());
        let client = reqwest::Client::builder().build().map_err(|e| {
            crate::error::EmotagError::BackendUnavailable {
                backend: Self::NAME.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self { client, url, token })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl AudioClassifier for HttpAudioClassifier {
    async fn classify(&self, audio: &DecodedAudio) -> Result<Vec<AudioPrediction>, AdapterError> {
        let body = audio
            .to_wav_bytes()
            .map_err(|e| AdapterError::Decode(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::backend(Self::NAME, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AdapterError::backend(Self::NAME, e.to_string()))?;
        if !status.is_success() {
            return Err(AdapterError::backend(
                Self::NAME,
                format!("status {}: {}", status.as_u16(), text),
            ));
        }

        parse_predictions(Self::NAME, &text)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Returns one configured label for every recording. Used for dry runs.
#[derive(Debug, Clone)]
pub struct FixedAudioClassifier {
    label: String,
}

impl FixedAudioClassifier {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

#[async_trait]
impl AudioClassifier for FixedAudioClassifier {
    async fn classify(&self, _audio: &DecodedAudio) -> Result<Vec<AudioPrediction>, AdapterError> {
        Ok(vec![AudioPrediction::new(&self.label, 1.0)])
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

type AudioResponder = dyn Fn(&DecodedAudio) -> Result<String, AdapterError> + Send + Sync;
type AudioDelay = dyn Fn(&DecodedAudio) -> Duration + Send + Sync;

/// Mock audio classifier for testing
#[derive(Clone)]
pub struct MockAudioClassifier {
    responder: Arc<AudioResponder>,
    delay: Arc<AudioDelay>,
    calls: Arc<AtomicUsize>,
}

impl MockAudioClassifier {
    /// Always answer with `label`.
    pub fn new(label: &str) -> Self {
        let label = label.to_string();
        Self::from_fn(move |_| Ok(label.clone()))
    }

    /// Answer with whatever `responder` returns for the recording.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&DecodedAudio) -> Result<String, AdapterError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: Arc::new(|_| Duration::ZERO),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to fail on every call
    pub fn with_failure(mut self) -> Self {
        self.responder =
            Arc::new(|_| Err(AdapterError::backend("mock-audio", "mock classifier failure")));
        self
    }

    /// Sleep for a per-recording duration before answering.
    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&DecodedAudio) -> Duration + Send + Sync + 'static,
    {
        self.delay = Arc::new(delay);
        self
    }

    /// Number of `classify` calls so far (shared between clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioClassifier for MockAudioClassifier {
    async fn classify(&self, audio: &DecodedAudio) -> Result<Vec<AudioPrediction>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = (self.delay)(audio);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let label = (self.responder)(audio)?;
        Ok(vec![AudioPrediction::new(&label, 0.9)])
    }

    fn name(&self) -> &str {
        "mock-audio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silence() -> DecodedAudio {
        DecodedAudio {
            samples: vec![0; 160],
            source_rate: 16000,
            source_channels: 1,
        }
    }

    #[test]
    fn top_label_picks_highest_score() {
        let predictions = vec![
            AudioPrediction::new("neu", 0.2),
            AudioPrediction::new("hap", 0.7),
            AudioPrediction::new("sad", 0.1),
        ];
        assert_eq!(top_label(&predictions), Some("hap"));
    }

    #[test]
    fn top_label_first_wins_on_tie() {
        let predictions = vec![
            AudioPrediction::new("angry", 0.5),
            AudioPrediction::new("sad", 0.5),
        ];
        assert_eq!(top_label(&predictions), Some("angry"));
    }

    #[test]
    fn top_label_empty() {
        assert_eq!(top_label(&[]), None);
    }

    #[test]
    fn parse_flat_prediction_list() {
        let body = r#"[{"label":"happy","score":0.81},{"label":"normal","score":0.12}]"#;
        let predictions = parse_predictions("test", body).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(top_label(&predictions), Some("happy"));
    }

    #[test]
    fn parse_batched_prediction_list() {
        let body = r#"[[{"label":"sad","score":0.6},{"label":"angry","score":0.3}]]"#;
        let predictions = parse_predictions("test", body).unwrap();
        assert_eq!(top_label(&predictions), Some("sad"));
    }

    #[test]
    fn parse_single_label_object() {
        let predictions = parse_predictions("test", r#"{"label":"Angry"}"#).unwrap();
        assert_eq!(predictions, vec![AudioPrediction::new("Angry", 1.0)]);
    }

    #[test]
    fn parse_error_body() {
        let result = parse_predictions("test", r#"{"error":"Model is currently loading"}"#);
        match result {
            Err(AdapterError::InvalidResponse { message, .. }) => {
                assert_eq!(message, "Model is currently loading");
            }
            other => panic!("Expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn parse_rejects_empty_and_garbage() {
        assert!(parse_predictions("test", "[]").is_err());
        assert!(parse_predictions("test", "<html>").is_err());
        assert!(parse_predictions("test", r#"[{"score":0.4}]"#).is_err());
    }

    #[tokio::test]
    async fn fixed_classifier_returns_label() {
        let classifier = FixedAudioClassifier::new("normal");
        let predictions = classifier.classify(&silence()).await.unwrap();
        assert_eq!(top_label(&predictions), Some("normal"));
        assert_eq!(classifier.name(), "fixed");
    }

    #[tokio::test]
    async fn mock_counts_calls_across_clones() {
        let mock = MockAudioClassifier::new("happy");
        let clone = mock.clone();

        clone.classify(&silence()).await.unwrap();
        mock.classify(&silence()).await.unwrap();

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn mock_failure() {
        let mock = MockAudioClassifier::new("happy").with_failure();
        let result = mock.classify(&silence()).await;
        assert!(matches!(result, Err(AdapterError::Backend { .. })));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn mock_from_fn_sees_audio() {
        let mock = MockAudioClassifier::from_fn(|audio| Ok(format!("len{}", audio.samples.len())));
        let predictions = mock.classify(&silence()).await.unwrap();
        assert_eq!(top_label(&predictions), Some("len160"));
    }

    #[test]
    fn classifier_trait_is_object_safe() {
        let classifier: Arc<dyn AudioClassifier> = Arc::new(FixedAudioClassifier::new("sad"));
        assert_eq!(classifier.name(), "fixed");
    }
}
