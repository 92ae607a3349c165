//! Retry logic with exponential backoff for classifier HTTP calls.
//!
//! Retries on transient errors (408, 429, 5xx, network failures).
//! Does NOT retry on client errors (400, 401, 403, 404).

use emoquest_core::ClassifierError;
use rand::Rng;
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for each subsequent delay.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Execute an async HTTP operation with retry logic.
///
/// Returns the first successful `Response`. Non-retryable statuses fail
/// immediately with `ClassifierError::Status`; once attempts run out the
/// last error is returned.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, ClassifierError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
{
    let mut delay = config.initial_delay;
    let mut last_error = ClassifierError::Request("no attempts made".to_string());
    let attempts = config.max_attempts.max(1);

    for attempt in 1..=attempts {
        match operation().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    if attempt > 1 {
                        tracing::info!("Classifier succeeded on attempt {}", attempt);
                    }
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                let err = ClassifierError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                };
                if !is_retryable_status(status) {
                    return Err(err);
                }
                tracing::warn!("Classifier returned {} on attempt {}/{}", status, attempt, attempts);
                last_error = err;
            }
            Err(e) => {
                tracing::warn!("Classifier network error on attempt {}/{}: {}", attempt, attempts, e);
                last_error = ClassifierError::Request(e.to_string());
            }
        }

        if attempt < attempts {
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..250));
            let sleep_time = delay + jitter;
            tracing::info!(
                "Classifier retrying in {:.1}s (attempt {}/{})",
                sleep_time.as_secs_f64(),
                attempt + 1,
                attempts
            );
            tokio::time::sleep(sleep_time).await;

            delay = Duration::from_secs_f64(
                (delay.as_secs_f64() * config.backoff_factor).min(config.max_delay.as_secs_f64()),
            );
        }
    }

    Err(last_error)
}
