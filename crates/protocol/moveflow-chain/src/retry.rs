//! Retry logic with linear backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{ChainError, ChainResult};

/// Retry policy with linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    max_retries: u32,
    /// Delay unit; retry `n` waits `base_delay * n`
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Create from retry config.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay)
    }

    /// Policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Execute an async operation with retry logic.
    ///
    /// Only retries on retryable errors (network, timeout, 429, 5xx).
    /// Returns immediately on non-retryable errors.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> ChainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ChainResult<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut last_error = None;

        for attempt in 0..max_attempts {
            let delay = self.delay_for_attempt(attempt);
            if !delay.is_zero() {
                debug!(attempt, ?delay, "Retrying after delay");
                sleep(delay).await;
            }

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() && attempt + 1 < max_attempts {
                        warn!(
                            attempt = attempt + 1,
                            max_attempts,
                            error = %e,
                            "Retryable error, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChainError::timeout("max retries exceeded")))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_delay_is_linear() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test]
    async fn test_execute_success_first_attempt() {
        let policy = RetryPolicy::default();
        let attempts = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ChainError>(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_retry_on_server_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        let attempts = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(ChainError::http(503, "unavailable"))
                    } else {
                        Ok::<_, ChainError>("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_no_retry_on_malformed() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        let attempts = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(ChainError::malformed("expected array"))
                }
            })
            .await;

        assert!(matches!(result, Err(ChainError::Malformed(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let attempts = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(ChainError::network("always fails"))
                }
            })
            .await;

        assert!(matches!(result, Err(ChainError::Network(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }
}
