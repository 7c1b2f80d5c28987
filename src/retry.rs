//! Retry Policy Module
//!
//! Every network-facing operation in the orchestrator runs under an explicit
//! retry policy instead of an open-coded `loop`. The policy decides how many
//! attempts are allowed and how long to back off between them; a classifier
//! on the error type decides whether an attempt is worth repeating at all.
//!
//! Transient errors (timeouts, connection failures) are retried with
//! exponential backoff. Definitive errors (rejections, stale versions,
//! malformed input) break the loop immediately and are surfaced to the
//! caller, since looping on those would never converge.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Classifies an error as transient (retryable) or definitive
pub trait Classify {
    fn is_transient(&self) -> bool;
}

/// Bounded or unbounded retry schedule with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// `None` retries forever; `Some(n)` gives up after `n` attempts
    max_attempts: Option<u32>,
    /// Delay before the second attempt; doubles each attempt after that
    base_delay: Duration,
    /// Ceiling on the backoff delay
    max_delay: Duration,
}

impl RetryPolicy {
    /// Retry transient failures without bound
    pub fn unbounded(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: None,
            base_delay,
            max_delay,
        }
    }

    /// Give up with [`RetryError::Exhausted`] after `max_attempts` attempts
    pub fn bounded(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            base_delay,
            max_delay,
        }
    }

    /// Backoff delay after the given attempt number (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    fn allows(&self, next_attempt: u32) -> bool {
        match self.max_attempts {
            None => true,
            Some(max) => next_attempt <= max,
        }
    }
}

/// Failure outcome of a retried operation
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The error was classified as definitive; retrying would not help
    #[error("definitive failure: {0}")]
    Definitive(E),

    /// The policy's attempt bound was exceeded
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

/// Run `op` under `policy`, retrying transient failures
///
/// # Arguments
/// * `policy` - attempt bound and backoff schedule
/// * `label` - short operation name used in log lines
/// * `op` - the operation; called once per attempt
///
/// # Returns
/// The successful value together with the number of attempts consumed, or a
/// [`RetryError`] naming why the loop stopped.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<(T, u32), RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{label} succeeded on attempt {attempt}");
                }
                return Ok((value, attempt));
            }
            Err(e) if !e.is_transient() => {
                warn!("{label} failed definitively on attempt {attempt}: {e}");
                return Err(RetryError::Definitive(e));
            }
            Err(e) => {
                if !policy.allows(attempt + 1) {
                    warn!("{label} exhausted after {attempt} attempts: {e}");
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }
                let delay = policy.delay_after(attempt);
                debug!("{label} transient failure on attempt {attempt}, retrying in {delay:?}: {e}");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient={})", self.transient)
        }
    }

    impl Classify for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::bounded(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn transient_twice_then_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(10), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError { transient: true })
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        let (value, attempts) = result.unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn definitive_error_breaks_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<((), u32), _> = with_retry(&fast_policy(10), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError { transient: false }) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Definitive(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_policy_exhausts() {
        let calls = AtomicU32::new(0);
        let result: Result<((), u32), _> = with_retry(&fast_policy(3), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError { transient: true }) }
        })
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::bounded(
            10,
            Duration::from_millis(100),
            Duration::from_millis(500),
        );
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        // capped at max_delay from here on
        assert_eq!(policy.delay_after(4), Duration::from_millis(500));
        assert_eq!(policy.delay_after(16), Duration::from_millis(500));
    }
}
