//! Retry wrapper for rate-limited model calls.
//!
//! Wraps any `Model` and retries requests that fail with a rate-limit error,
//! sleeping with exponential backoff between attempts. All other errors are
//! returned immediately.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use viva_abstraction::{AudioData, Model, ModelError, ModelResponse};

/// Retry policy for rate-limited model calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff).
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay: Duration::from_secs(60), multiplier: 2.0 }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration, multiplier: f64) -> Self {
        Self { max_attempts, initial_delay, multiplier }
    }

    /// Calculate the delay before the given retry attempt (1-based).
    ///
    /// Uses exponential backoff: initial_delay * multiplier^(attempt - 1).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = (self.initial_delay.as_millis() as f64
            * self.multiplier.powi(attempt.saturating_sub(1) as i32)) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// A `Model` decorator that retries rate-limited requests.
#[derive(Debug)]
pub struct RetryingModel {
    inner: Arc<dyn Model>,
    policy: RetryPolicy,
}

impl RetryingModel {
    /// Wraps the given model with the given retry policy.
    pub fn new(inner: Arc<dyn Model>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_retry<F, Fut>(&self, mut op: F) -> Result<ModelResponse, ModelError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<ModelResponse, ModelError>> + Send,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_rate_limit() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis(),
                        "Rate limited, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl Model for RetryingModel {
    async fn generate_text(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        self.with_retry(|| self.inner.generate_text(prompt)).await
    }

    async fn generate_with_audio(
        &self,
        prompt: &str,
        audio: &AudioData,
    ) -> Result<ModelResponse, ModelError> {
        self.with_retry(|| self.inner.generate_with_audio(prompt, audio)).await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
