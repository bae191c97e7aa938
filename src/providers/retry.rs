//! Retrying decorator for the decision service.
//!
//! Only failures to get a reply at all are retried, as classified by
//! [`VedrError::is_transient`]. A reply that arrives but does not decode is
//! the model's answer and is scored as such; it passes through untouched and
//! the prompt is never re-asked. Once every attempt has failed the last error
//! goes back to the selection client, which scores the prompt as unparseable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::ChatProvider;
use crate::telemetry;
use crate::types::{ChatOptions, ChatResponse, Message};
use crate::{Result, VedrError};

/// Backoff settings, mirroring the `[retry]` config section.
///
/// ```rust
/// # use vedrfolnir::RetryConfig;
/// # use std::time::Duration;
/// let retry = RetryConfig {
///     max_attempts: 4,
///     initial_delay: Duration::from_millis(250),
///     max_delay: Duration::from_secs(5),
/// };
/// assert_eq!(retry.delay_before(2, None), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Calls per prompt, the first included. 1 never retries.
    pub max_attempts: u32,
    /// Wait before the first retry; doubles for each one after.
    pub initial_delay: Duration,
    /// Ceiling on any single wait, server `retry-after` hints included.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Whether a failed call is ever repeated.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Wait before retry number `retry` (0 is the first retry).
    ///
    /// A server hint replaces the computed backoff. Either way the wait is
    /// capped at `max_delay` so one throttled prompt cannot stall a run.
    pub fn delay_before(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let backoff = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(retry));
        hint.unwrap_or(backoff).min(self.max_delay)
    }
}

/// Wraps a [`ChatProvider`] and repeats calls that failed transiently.
pub struct RetryingChatProvider {
    inner: Arc<dyn ChatProvider>,
    config: RetryConfig,
}

impl RetryingChatProvider {
    pub fn new(inner: Arc<dyn ChatProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl ChatProvider for RetryingChatProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse> {
        let attempts = self.config.max_attempts.max(1);
        let mut retry = 0;
        loop {
            let err = match self.inner.chat(messages, options).await {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            if retry + 1 >= attempts {
                if attempts > 1 {
                    warn!(
                        provider = self.inner.name(),
                        attempts,
                        error = %err,
                        "decision service still failing, giving up on prompt"
                    );
                }
                return Err(err);
            }

            let delay = self.config.delay_before(retry, err.retry_after());
            metrics::counter!(telemetry::RETRIES_TOTAL,
                "provider" => self.inner.name().to_owned(),
                "reason" => reason(&err),
            )
            .increment(1);
            warn!(
                provider = self.inner.name(),
                attempt = retry + 2,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying decision request"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}

fn reason(err: &VedrError) -> &'static str {
    match err {
        VedrError::RateLimited { .. } => "rate_limited",
        VedrError::Api { .. } => "server_error",
        VedrError::EmptyResponse => "empty_response",
        _ => "transport",
    }
}
