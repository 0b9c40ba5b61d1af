//! Retry middleware for calls to external services.
//!
//! Applied by the caller around a retrieval or embedding call; the
//! clients themselves never retry, so a wrapped ensemble retrieval is
//! retried as one unit.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::errors::RetrievalError;

/// Upper bound on a single backoff sleep.
const MAX_DELAY_SECS: f64 = 600.0;

/// Exponential backoff settings.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first failure; 3 retries mean up to 4 calls.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Sleep before retry number `attempt` (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * factor).clamp(0.0, MAX_DELAY_SECS);
        Duration::from_secs_f64(secs)
    }
}

/// Run `op`, retrying failures for which `should_retry` holds.
///
/// Retryable failures are logged at warn level per retry and at error
/// level once the budget is spent; the last error then propagates.
/// Failures the predicate declines propagate immediately.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !should_retry(&err) {
                    return Err(err);
                }
                attempt += 1;
                if attempt > policy.max_retries {
                    tracing::error!("Giving up after {} retries: {}", policy.max_retries, err);
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Retry {}/{} in {:?}: {}",
                    attempt,
                    policy.max_retries,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// [`retry_if`] specialised to transient retrieval errors.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, RetrievalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetrievalError>>,
{
    retry_if(policy, RetrievalError::is_retryable, op).await
}
