//! Bounded retry for ledger transactions that lose an optimistic race.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use stockwise_core::CoreResult;
use tracing::warn;

/// How many times a conflicting transaction is re-run, and how long to wait
/// in between. Backoff doubles per attempt, with random jitter on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_backoff: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            base_backoff,
        }
    }

    /// Runs once and surfaces the first conflict.
    pub fn no_retry() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }

    /// Delay after the given failed attempt (1-based), capped at 32× base.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(5);
        self.base_backoff.saturating_mul(1 << exponent)
    }

    /// `backoff_for(attempt)` plus a random share of up to the same amount,
    /// so writers that lost the same race wake at different times.
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff_for(attempt);
        let ceiling = base.as_micros().min(u64::MAX as u128) as u64;
        if ceiling == 0 {
            return base;
        }
        base + Duration::from_micros(rand::thread_rng().gen_range(0..=ceiling))
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up. The last error is returned as is.
pub async fn retry_on_conflict<T, F, Fut>(policy: RetryPolicy, label: &str, mut operation: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.jittered_backoff(attempt);
                warn!(
                    operation = %label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Conflict, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use stockwise_core::CoreError;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(10));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(10));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(20));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(40));
        assert_eq!(policy.backoff_for(9), Duration::from_millis(320));
    }

    #[test]
    fn test_jitter_stays_within_one_extra_backoff() {
        let policy = RetryPolicy::new(10, Duration::from_millis(10));
        for attempt in 1..=4 {
            let base = policy.backoff_for(attempt);
            for _ in 0..50 {
                let delay = policy.jittered_backoff(attempt);
                assert!(delay >= base && delay <= base * 2, "{delay:?} outside [{base:?}, {:?}]", base * 2);
            }
        }

        assert_eq!(RetryPolicy::no_retry().jittered_backoff(1), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let result = retry_on_conflict(policy, "test", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(CoreError::conflict("Product", "p-1"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: CoreResult<()> = retry_on_conflict(policy, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::conflict("Product", "p-1"))
        })
        .await;

        assert!(matches!(result, Err(CoreError::Conflict { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: CoreResult<()> = retry_on_conflict(RetryPolicy::default(), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::not_found("Product", "p-1"))
        })
        .await;

        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
