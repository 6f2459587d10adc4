//! Generic retry-with-backoff executor for provider calls.
//!
//! Composition instead of inheritance: adapters hand a stateless raw-call
//! closure to [`execute_with_retry`], parameterized by a [`RetryPolicy`] and
//! optional [`RetryHooks`]. Only transient errors (rate limits, outages) are
//! retried; the backoff sleep uses `tokio::time::sleep` and is cancel-safe.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Retry budget and backoff shape for a single provider adapter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    pub max_retries: u32,
    /// Exponential backoff base in seconds.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    /// Fixed exponential backoff: `backoff_factor * 2^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(attempt as i32))
    }
}

/// Observation hooks passed as function values rather than inherited methods.
#[derive(Default)]
pub struct RetryHooks {
    /// Called before every attempt with the zero-based attempt index.
    pub before_attempt: Option<Box<dyn Fn(u32) + Send + Sync>>,
    /// Called after a failed attempt that will be retried.
    pub on_backoff: Option<Box<dyn Fn(u32, Duration) + Send + Sync>>,
}

/// Run `operation` with retry on transient errors, up to
/// `policy.max_retries` retries (so `max_retries + 1` total attempts).
///
/// Non-transient errors return immediately. The last transient error is
/// returned once the budget is exhausted.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    hooks: &RetryHooks,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        if let Some(before) = &hooks.before_attempt {
            before(attempt);
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient provider error, backing off"
                );
                if let Some(on_backoff) = &hooks.on_backoff {
                    on_backoff(attempt, delay);
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
