//! Retry policy for embedding calls.
//!
//! Every call is retried on transient failures (rate limits, connection
//! errors, 5xx) with randomized exponential backoff. After a failed
//! attempt `n` (1-based) the wait is drawn uniformly from
//! `[min_wait, clamp(2^(n-1) s, min_wait, max_wait)]`.

use std::time::Duration;

use rand::Rng;

use super::EmbeddingProvider;
use crate::config::RetryConfig;
use crate::error::EmbeddingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.num_retries.max(1),
            min_wait: Duration::from_secs(config.min_wait_secs),
            max_wait: Duration::from_secs(config.max_wait_secs.max(config.min_wait_secs)),
        }
    }

    /// Upper bound of the wait after failed attempt `attempt` (1-based).
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let exponential = Duration::from_secs_f64(2f64.powi(exponent).min(u32::MAX as f64));
        exponential.clamp(self.min_wait, self.max_wait)
    }

    /// A randomized wait in `[min_wait, backoff_ceiling(attempt)]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let low = self.min_wait.as_secs_f64();
        let high = self.backoff_ceiling(attempt).as_secs_f64();
        if high <= low {
            return self.min_wait;
        }
        Duration::from_secs_f64(rand::rng().random_range(low..=high))
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent. The last error is returned unchanged.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, EmbeddingError>,
    ) -> Result<T, EmbeddingError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    tracing::error!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "{err}. Attempt #{attempt} | retry limits are set in the [retry] config section"
                    );
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    std::thread::sleep(self.backoff(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

/// Wraps a provider so every call goes through a [`RetryPolicy`].
pub struct RetryingProvider {
    inner: Box<dyn EmbeddingProvider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Box<dyn EmbeddingProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl EmbeddingProvider for RetryingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.policy.run(|| self.inner.embed(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.policy.run(|| self.inner.embed_batch(texts))
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> String {
        self.inner.model_id()
    }
}
