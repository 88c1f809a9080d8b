//! Retry with exponential backoff for any provider.
//!
//! Retries: rate limits (429), server errors (5xx), timeouts, connection
//! failures. Does NOT retry: bad requests, auth errors, malformed output.

use async_trait::async_trait;
use crossclaw_core::error::ProviderError;
use crossclaw_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Backoff schedule for [`RetryProvider`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&crossclaw_config::RetryConfig::default())
    }
}

impl From<&crossclaw_config::RetryConfig> for RetryPolicy {
    fn from(config: &crossclaw_config::RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_factor: config.backoff_factor,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// A server-provided wait wins over the computed backoff; both are capped
    /// at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32, server_hint: Option<Duration>) -> Duration {
        if let Some(hint) = server_hint {
            return hint.min(self.max_delay);
        }
        let base_ms = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

/// A provider wrapper that retries transient failures.
pub struct RetryProvider {
    inner: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn Provider>) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(inner: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_transient() || attempt >= self.policy.max_retries {
                        return Err(e);
                    }

                    let hint = e.retry_after_secs().map(Duration::from_secs);
                    let delay = self.policy.delay_for_attempt(attempt, hint);

                    warn!(
                        provider = self.inner.name(),
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {}",
                        e
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
