use crate::utils::error::{JudgeError, Result};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

impl Backoff {
    /// Unknown strings fall back to Fixed; config validation rejects them
    /// before this is ever reached.
    pub fn parse_or_default(s: &str) -> Backoff {
        match s {
            "exponential" => Backoff::Exponential,
            _ => Backoff::Fixed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
    pub backoff: Backoff,
}

/// Wraps one inference call with bounded retries, backoff and a per-attempt
/// timeout. Parameterized per use site: classification runs short/many,
/// evaluation runs long/few.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    settings: RetrySettings,
}

impl RetryPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    /// One attempt, no backoff. Used for the single simplified-prompt retry
    /// after a parse failure.
    pub fn single_attempt(timeout: Duration) -> Self {
        Self::new(RetrySettings {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            timeout,
            backoff: Backoff::Fixed,
        })
    }

    pub async fn invoke<F, Fut, T>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.settings.max_retries + 1;
        let mut delay = self.settings.base_delay;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match timeout(self.settings.timeout, f()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        info!(
                            "✅ '{}' succeeded on attempt {}/{}",
                            operation, attempt, attempts
                        );
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                }
                Err(_) => {
                    last_error = format!("timed out after {:?}", self.settings.timeout);
                }
            }

            if attempt < attempts {
                warn!(
                    "⚠️ '{}' attempt {}/{} failed: {}; retrying in {:?}",
                    operation, attempt, attempts, last_error, delay
                );
                sleep(delay).await;
                if self.settings.backoff == Backoff::Exponential {
                    delay = (delay * 2).min(self.settings.max_delay);
                }
            }
        }

        Err(JudgeError::InferenceError {
            operation: operation.to_string(),
            message: format!("{} attempts exhausted; last error: {}", attempts, last_error),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_policy(max_retries: usize, backoff: Backoff) -> RetryPolicy {
        RetryPolicy::new(RetrySettings {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            timeout: Duration::from_secs(5),
            backoff,
        })
    }

    fn transient() -> JudgeError {
        JudgeError::InferenceError {
            operation: "probe".to_string(),
            message: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let policy = quick_policy(3, Backoff::Exponential);

        let result = policy
            .invoke("probe", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(transient())
                    } else {
                        Ok("done".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries_with_last_cause() {
        let calls = AtomicUsize::new(0);
        let policy = quick_policy(2, Backoff::Fixed);

        let result: Result<String> = policy
            .invoke("probe", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(JudgeError::InferenceError { operation, message }) => {
                assert_eq!(operation, "probe");
                assert!(message.contains("3 attempts"));
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected InferenceError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let policy = RetryPolicy::new(RetrySettings {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(10),
            backoff: Backoff::Fixed,
        });

        let result: Result<String> = policy
            .invoke("slow", || async {
                sleep(Duration::from_secs(2)).await;
                Ok("late".to_string())
            })
            .await;

        match result {
            Err(JudgeError::InferenceError { message, .. }) => {
                assert!(message.contains("timed out"));
            }
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_attempt_never_retries() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::single_attempt(Duration::from_secs(1));

        let result: Result<String> = policy
            .invoke("once", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_parsing() {
        assert_eq!(Backoff::parse_or_default("exponential"), Backoff::Exponential);
        assert_eq!(Backoff::parse_or_default("fixed"), Backoff::Fixed);
        assert_eq!(Backoff::parse_or_default("anything"), Backoff::Fixed);
    }
}
