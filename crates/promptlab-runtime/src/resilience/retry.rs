//! Timeout and retry around a single model call.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// How often and how patiently a failed call is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Call the provider, bounding each attempt by `config.timeout` and
/// retrying errors that [`ProviderError::is_retryable`] allows.
pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    messages: &[ChatMessage],
    config: &CompletionConfig,
    policy: RetryPolicy,
) -> Result<CompletionResponse, ProviderError> {
    let attempt = || async {
        match tokio::time::timeout(config.timeout, provider.complete(messages.to_vec(), config))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(config.timeout)),
        }
    };

    attempt
        .retry(policy.backoff())
        .when(ProviderError::is_retryable)
        .notify(|error: &ProviderError, delay: Duration| {
            tracing::warn!(
                provider = provider.name(),
                error = %error,
                delay = ?delay,
                "model call failed, retrying"
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokenUsage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times with `error`, then answers.
    struct FlakyProvider {
        failures: u32,
        error: ProviderError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            Ok(CompletionResponse {
                content: "ok".to_string(),
                usage: TokenUsage::default(),
                model: config.model.clone(),
                stop_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::HttpError("unreachable".to_string()))
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let provider = FlakyProvider {
            failures: 2,
            error: ProviderError::RateLimited { retry_after: None },
            calls: AtomicU32::new(0),
        };
        let response = complete_with_retry(
            &provider,
            &[ChatMessage::user("hi")],
            &CompletionConfig::default(),
            fast_policy(3),
        )
        .await
        .unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let provider = FlakyProvider {
            failures: 10,
            error: ProviderError::HttpError("connection reset".to_string()),
            calls: AtomicU32::new(0),
        };
        let result = complete_with_retry(
            &provider,
            &[ChatMessage::user("hi")],
            &CompletionConfig::default(),
            fast_policy(2),
        )
        .await;
        assert!(matches!(result, Err(ProviderError::HttpError(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_auth_errors() {
        let provider = FlakyProvider {
            failures: 1,
            error: ProviderError::AuthError,
            calls: AtomicU32::new(0),
        };
        let result = complete_with_retry(
            &provider,
            &[ChatMessage::user("hi")],
            &CompletionConfig::default(),
            fast_policy(3),
        )
        .await;
        assert!(matches!(result, Err(ProviderError::AuthError)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_per_attempt() {
        let config = CompletionConfig {
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let result =
            complete_with_retry(&SlowProvider, &[ChatMessage::user("hi")], &config, fast_policy(0))
                .await;
        assert!(matches!(result, Err(ProviderError::Timeout(d)) if d == Duration::from_secs(5)));
    }
}
