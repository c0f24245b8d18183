//! Bounded retry with exponential backoff for remote calls.

use std::future::Future;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{ApiError, SyncError};

/// Backoff schedule for remote calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries (not counting the initial attempt).
    pub max_retries: u32,
    /// Backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling on the backoff delay.
    pub max_delay: Duration,
    /// Down-jitter factor (0.25 = delay reduced by up to 25%).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `backoff_step + 1`.
    ///
    /// Exponential in the step, capped at `max_delay`, with down-jitter so
    /// concurrent clients do not retry in lockstep.
    #[must_use]
    pub fn backoff_delay(&self, backoff_step: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jitter = 1.0 - rand::random::<f64>() * self.jitter_factor;
        Duration::from_secs_f64(capped * jitter)
    }
}

/// Drives `op` until it succeeds, fails non-retryably, or retries run out.
///
/// The request id is constant across attempts so log lines from one logical
/// request can be correlated.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let request_id = Uuid::new_v4();
    let attempts = policy.max_retries + 1;

    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                let delay = policy.backoff_delay(attempt);
                tracing::debug!(
                    %request_id,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "remote call failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                return Err(SyncError::Remote {
                    attempts: attempt + 1,
                    source: err,
                });
            }
        }
    }
    unreachable!("loop either returns a value or an error");
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
