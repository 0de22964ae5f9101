//! Text sentiment analyzers.

use crate::classify::error::AdapterError;
use crate::signal::TextSignal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Trait for text sentiment analysis.
///
/// Returns a `(score, magnitude)` pair; score nominally in [-1, 1],
/// magnitude non-negative.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<TextSignal, AdapterError>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    language: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentResponse {
    document_sentiment: Option<DocumentSentiment>,
}

#[derive(Deserialize)]
struct DocumentSentiment {
    // The API omits zero-valued fields.
    #[serde(default)]
    score: f64,
    #[serde(default)]
    magnitude: f64,
}

fn sentiment_request<'a>(text: &'a str, language: &'a str) -> AnalyzeSentimentRequest<'a> {
    AnalyzeSentimentRequest {
        document: Document {
            kind: "PLAIN_TEXT",
            language,
            content: text,
        },
        encoding_type: "UTF8",
    }
}

/// Parse a Cloud Natural Language `documents:analyzeSentiment` response.
pub fn parse_sentiment(backend: &str, body: &str) -> Result<TextSignal, AdapterError> {
    let response: AnalyzeSentimentResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::invalid_response(backend, format!("unexpected shape: {e}")))?;
    let sentiment = response
        .document_sentiment
        .ok_or_else(|| AdapterError::invalid_response(backend, "missing documentSentiment"))?;
    Ok(TextSignal::new(sentiment.score, sentiment.magnitude))
}

/// Sentiment analysis through the Cloud Natural Language REST API.
#[cfg(feature = "http")]
pub struct GoogleSentimentAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    api_key: String,
}

#[cfg(feature = "http")]
impl GoogleSentimentAnalyzer {
    const NAME: &'static str = "google";

    /// Build from config. Fails if the API key variable is unset, so a run
    /// without credentials stops before touching any row.
    pub fn new(config: &crate::config::TextConfig) -> crate::error::Result<Self> {
        let unavailable = |message: String| crate::error::EmotagError::BackendUnavailable {
            backend: Self::NAME.to_string(),
            message,
        };
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| unavailable(format!("{} is not set", config.api_key_env)))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            api_key,
        })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl SentimentAnalyzer for GoogleSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<TextSignal, AdapterError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&sentiment_request(text, &self.language))
            .send()
            .await
            .map_err(|e| AdapterError::backend(Self::NAME, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::backend(Self::NAME, e.to_string()))?;
        if !status.is_success() {
            return Err(AdapterError::backend(
                Self::NAME,
                format!("status {}: {}", status.as_u16(), body),
            ));
        }

        parse_sentiment(Self::NAME, &body)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Returns one configured signal for every text. Used for dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedSentimentAnalyzer {
    signal: TextSignal,
}

impl FixedSentimentAnalyzer {
    pub fn new(score: f64, magnitude: f64) -> Self {
        Self {
            signal: TextSignal::new(score, magnitude),
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for FixedSentimentAnalyzer {
    async fn analyze(&self, _text: &str) -> Result<TextSignal, AdapterError> {
        Ok(self.signal)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

type TextResponder = dyn Fn(&str) -> Result<TextSignal, AdapterError> + Send + Sync;

/// Mock sentiment analyzer for testing
#[derive(Clone)]
pub struct MockSentimentAnalyzer {
    responder: Arc<TextResponder>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockSentimentAnalyzer {
    /// Always answer with `(score, magnitude)`.
    pub fn new(score: f64, magnitude: f64) -> Self {
        Self::from_fn(move |_| Ok(TextSignal::new(score, magnitude)))
    }

    /// Answer with whatever `responder` returns for the text.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<TextSignal, AdapterError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to fail on every call
    pub fn with_failure(mut self) -> Self {
        self.responder = Arc::new(|_| {
            Err(AdapterError::backend(
                "mock-text",
                "mock analyzer failure",
            ))
        });
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `analyze` calls so far (shared between clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentAnalyzer for MockSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<TextSignal, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(text)
    }

    fn name(&self) -> &str {
        "mock-text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_api_shape() {
        let json = serde_json::to_value(sentiment_request("テスト用の文章です", "ja")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "document": {
                    "type": "PLAIN_TEXT",
                    "language": "ja",
                    "content": "テスト用の文章です"
                },
                "encodingType": "UTF8"
            })
        );
    }

    #[test]
    fn parse_full_response() {
        let body = r#"{
            "documentSentiment": {"magnitude": 1.2, "score": 0.8},
            "language": "ja",
            "sentences": []
        }"#;
        let signal = parse_sentiment("test", body).unwrap();
        assert_eq!(signal, TextSignal::new(0.8, 1.2));
    }

    #[test]
    fn parse_keeps_full_precision() {
        let body = r#"{"documentSentiment": {"magnitude": 0.9, "score": 0.70000001}}"#;
        let signal = parse_sentiment("test", body).unwrap();
        assert_eq!(signal.score, 0.700_000_01);
        assert!(signal.score > crate::policy::POLARIZED_THRESHOLD);
    }

    #[test]
    fn parse_omitted_zero_fields() {
        let signal = parse_sentiment("test", r#"{"documentSentiment": {}}"#).unwrap();
        assert_eq!(signal, TextSignal::neutral());
    }

    #[test]
    fn parse_missing_sentiment_is_error() {
        let result = parse_sentiment("test", r#"{"language": "ja"}"#);
        assert!(matches!(result, Err(AdapterError::InvalidResponse { .. })));
    }

    #[test]
    fn parse_garbage_is_error() {
        assert!(parse_sentiment("test", "not json").is_err());
    }

    #[tokio::test]
    async fn fixed_analyzer_returns_signal() {
        let analyzer = FixedSentimentAnalyzer::new(-0.5, 0.8);
        assert_eq!(
            analyzer.analyze("anything").await.unwrap(),
            TextSignal::new(-0.5, 0.8)
        );
    }

    #[tokio::test]
    async fn mock_from_fn_sees_text() {
        let mock = MockSentimentAnalyzer::from_fn(|text| {
            Ok(if text.contains("テスト用") {
                TextSignal::new(0.8, 1.2)
            } else {
                TextSignal::new(-0.5, 0.8)
            })
        });

        assert_eq!(
            mock.analyze("テスト用の文章です").await.unwrap(),
            TextSignal::new(0.8, 1.2)
        );
        assert_eq!(mock.analyze("別の文").await.unwrap().score, -0.5);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn mock_failure() {
        let mock = MockSentimentAnalyzer::new(0.1, 0.1).with_failure();
        assert!(mock.analyze("text").await.is_err());
        assert_eq!(mock.calls(), 1);
    }
}
