//! Caller-side retry for completion requests.
//!
//! The agent loop never retries on its own. Wrap a client in
//! [`RetryingClient`] to retry transient provider failures with bounded
//! exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolSchema};

/// Backoff configuration for completion retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum backoff cap.
    pub max_delay: Duration,
    /// Multiplier per retry (typically 2.0).
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (0 = first retry), without jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay_secs = self.base_delay.as_secs_f64() * self.multiplier.powi(retry as i32);
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// `delay_for` plus up to 20% random jitter, still capped at `max_delay`.
    fn jittered_delay(&self, retry: u32) -> Duration {
        let base = self.delay_for(retry);
        let jitter = rand::thread_rng().gen_range(0.0..=0.2);
        base.mul_f64(1.0 + jitter).min(self.max_delay)
    }
}

/// An [`LlmClient`] that retries transient failures of the wrapped client.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: LlmClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for RetryingClient<C> {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.chat_completion(model, messages, tools).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.jittered_delay(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedClient;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let scripted = ScriptedClient::new(vec![
            Err(LlmError::Timeout),
            Err(LlmError::RateLimited("busy".to_string())),
            Ok(ChatResponse::stop("ok")),
        ]);
        let client = RetryingClient::new(scripted.clone(), fast_policy(3));

        let response = client
            .chat_completion("m", &[ChatMessage::user("hi")], None)
            .await
            .unwrap();

        assert_eq!(response.content.as_deref(), Some("ok"));
        assert_eq!(scripted.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let scripted = ScriptedClient::new(vec![
            Err(LlmError::Timeout),
            Err(LlmError::Timeout),
            Ok(ChatResponse::stop("too late")),
        ]);
        let client = RetryingClient::new(scripted.clone(), fast_policy(2));

        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Timeout));
        assert_eq!(scripted.calls(), 2);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let scripted = ScriptedClient::new(vec![Err(LlmError::Api {
            status: 401,
            message: "invalid key".to_string(),
        })]);
        let client = RetryingClient::new(scripted.clone(), fast_policy(5));

        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 401, .. }));
        assert_eq!(scripted.calls(), 1);
    }
}
