//! Bounded retry for fallible async operations.
//!
//! Every attempt runs under the policy's timeout. The combinator returns the
//! first success, or the last error together with how many attempts were
//! made and how long they took in total.

use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub delay: Duration,
    /// When false, only errors the caller classifies as retryable are retried.
    pub retry_all: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(20),
            delay: Duration::ZERO,
            retry_all: true,
        }
    }
}

#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub elapsed: Duration,
    pub last_error: E,
}

pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> std::result::Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
    E: From<tokio::time::error::Elapsed> + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let started = Instant::now();
    let mut attempt = 1;

    loop {
        let outcome = match tokio::time::timeout(policy.timeout, operation(attempt)).await {
            Ok(result) => result,
            Err(elapsed) => Err(E::from(elapsed)),
        };

        match outcome {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("Succeeded on attempt {}/{}", attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(error) => {
                let retryable = policy.retry_all || is_retryable(&error);
                if attempt >= max_attempts || !retryable {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        elapsed: started.elapsed(),
                        last_error: error,
                    });
                }

                tracing::warn!(
                    "🔁 Attempt {}/{} failed: {} - retrying",
                    attempt,
                    max_attempts,
                    error
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}
