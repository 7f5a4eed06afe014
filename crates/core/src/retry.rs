//! Bounded fixed-interval retry.
//!
//! Every hardware-settling operation (link negotiation, bandwidth probe)
//! uses the same shape: try, and on failure wait one interval before the
//! next try, up to a fixed number of attempts. No attempt is made after
//! the last failure and no sleep follows it.

use std::future::Future;
use std::time::Duration;

/// Attempt ceiling shared by link negotiation and throughput probing.
pub const DEFAULT_ATTEMPTS: u32 = 10;

/// Interval between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Treated as at least 1.
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Upper bound on the time spent sleeping between attempts.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.attempts.max(1).saturating_sub(1)
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-based attempt number. On exhaustion the
/// error of the final attempt is returned.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "Retry succeeded");
                }
                return Ok(value);
            }
            Err(e) if attempt >= attempts => {
                tracing::debug!(attempts, error = %e, "Retries exhausted");
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(
                    attempt,
                    delay_ms = policy.interval.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying",
                );
            }
        }

        tokio::time::sleep(policy.interval).await;
        attempt += 1;
    }
}
