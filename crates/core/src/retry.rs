// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared exponential-backoff retry policy for outbound calls to the upstream VCS host.

use std::time::Duration;

/// Exponential backoff with a caller-supplied predicate deciding whether an error is retryable.
///
/// `max_attempts` counts the first try, so `max_attempts = 2` means "one retry".
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay, max_delay: Duration::from_secs(60) }
    }

    /// Delay to wait before the given attempt (1-indexed: the delay before attempt 2, 3, ...).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32.checked_shl(exp).unwrap_or(u32::MAX)).min(self.max_delay)
    }

    /// Run `f`, retrying on errors for which `should_retry` returns true, up to `max_attempts`.
    /// Sleeps between attempts using `delay_for`. Returns the last error if attempts are exhausted.
    pub async fn run<T, E, F, Fut>(&self, should_retry: impl Fn(&E) -> bool, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && should_retry(&err) => {
                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_doubles_each_attempt_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn retries_until_should_retry_returns_false() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<(), &str> = policy
            .run(
                |err: &&str| *err == "retry me",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("retry me") }
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result: Result<(), &str> = policy
            .run(
                |_err: &&str| false,
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("not found") }
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let result = policy
            .run(
                |_err: &&str| true,
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move { if n == 0 { Err("boom") } else { Ok(42) } }
                },
            )
            .await;
        assert_eq!(result, Ok(42));
    }
}
