//! Remote text-classification endpoint.
//!
//! Speaks the Hugging Face inference format: POST `{"inputs": text}` and
//! receive `[[{"label": .., "score": ..}, ..]]`. The flat `[{..}]` and bare
//! `{..}` shapes some self-hosted servers return are accepted too.

use crate::retry::{with_retry, RetryConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use emoquest_core::config::ClassifierConfig;
use emoquest_core::{Classification, ClassifierError, EmotionClassifier};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Single(LabelScore),
}

/// Extract the top-scoring label from an inference response body.
pub fn parse_response(body: &Value) -> Result<Classification, ClassifierError> {
    let parsed: InferenceResponse = serde_json::from_value(body.clone()).map_err(|e| {
        tracing::warn!("Unrecognised classifier response: {}", e);
        ClassifierError::NoLabel
    })?;

    let candidates = match parsed {
        InferenceResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        InferenceResponse::Flat(list) => list,
        InferenceResponse::Single(one) => vec![one],
    };

    candidates
        .into_iter()
        .filter(|c| !c.label.trim().is_empty() && c.score.is_finite())
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        .map(|top| Classification {
            label: top.label.trim().to_lowercase(),
            score: top.score.clamp(0.0, 1.0),
        })
        .ok_or(ClassifierError::NoLabel)
}

#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl HttpClassifier {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build HTTP client")?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            retry: RetryConfig::default(),
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .context("classifier.endpoint is required for the http provider")?;
        let mut classifier = Self::new(endpoint, &config.model, Duration::from_secs(config.timeout_secs))?;
        classifier.api_key = config.api_key.clone();
        classifier.retry.max_attempts = config.max_attempts;
        Ok(classifier)
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmotionClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let payload = json!({
            "inputs": text,
            "model": self.model,
        });

        let response = with_retry(&self.retry, || {
            let mut request = self.client.post(&self.endpoint).json(&payload);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
            request.send()
        })
        .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Request(format!("invalid response body: {}", e)))?;
        let classification = parse_response(&body)?;
        tracing::debug!(
            "Classifier {} → {} ({:.3})",
            self.model,
            classification.label,
            classification.score
        );
        Ok(classification)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_factor: 2.0,
        }
    }

    async fn classifier_for(server: &MockServer) -> HttpClassifier {
        HttpClassifier::new(&format!("{}/classify", server.uri()), "test-model", Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry())
    }

    #[test]
    fn test_parse_nested() {
        let body = json!([[{"label": "sadness", "score": 0.7}, {"label": "joy", "score": 0.2}]]);
        let c = parse_response(&body).unwrap();
        assert_eq!(c.label, "sadness");
        assert!((c.score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_parse_flat_picks_max() {
        let body = json!([{"label": "joy", "score": 0.1}, {"label": "Anger", "score": 0.85}]);
        let c = parse_response(&body).unwrap();
        assert_eq!(c.label, "anger");
    }

    #[test]
    fn test_parse_single() {
        let c = parse_response(&json!({"label": "fear", "score": 0.66})).unwrap();
        assert_eq!(c.label, "fear");
    }

    #[test]
    fn test_parse_empty_or_garbage() {
        assert!(matches!(parse_response(&json!([])), Err(ClassifierError::NoLabel)));
        assert!(matches!(parse_response(&json!([[]])), Err(ClassifierError::NoLabel)));
        assert!(matches!(
            parse_response(&json!({"error": "model loading"})),
            Err(ClassifierError::NoLabel)
        ));
    }

    #[tokio::test]
    async fn test_classify_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classify"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"inputs": "what a day", "model": "test-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[{"label": "joy", "score": 0.93}]])))
            .expect(1)
            .mount(&server)
            .await;

        let classifier = classifier_for(&server).await.with_api_key("secret");
        let c = classifier.classify("what a day").await.unwrap();
        assert_eq!(c.label, "joy");
        assert!((c.score - 0.93).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classify"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
            .expect(1)
            .mount(&server)
            .await;

        let err = classifier_for(&server).await.classify("hi").await.unwrap_err();
        match err {
            ClassifierError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad input");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classify"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = classifier_for(&server).await.classify("hi").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Status { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let classifier = HttpClassifier::new("http://127.0.0.1:9/classify", "m", Duration::from_millis(200))
            .unwrap()
            .with_retry(RetryConfig {
                max_attempts: 1,
                ..fast_retry()
            });
        let err = classifier.classify("hi").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Request(_)));
    }
}
