use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::NarratorError;

/// Bounded retry: a fixed number of attempts, each under its own timeout,
/// with `base_delay * 2^attempt + jitter_step * attempt` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub base_delay: Duration,
    pub jitter_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(45),
            base_delay: Duration::from_secs(1),
            jitter_step: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded(T),
    Exhausted {
        attempts: u32,
        last_error: Option<NarratorError>,
    },
}

impl RetryPolicy {
    /// Delay after the zero-based `attempt` fails.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        exponential.saturating_add(self.jitter_step.saturating_mul(attempt))
    }

    /// Runs `attempt_fn` until it succeeds or the attempts run out. Errors and
    /// timeouts are treated the same way.
    pub async fn run<T, F, Fut>(&self, mut attempt_fn: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, NarratorError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            let result = tokio::time::timeout(self.attempt_timeout, attempt_fn(attempt))
                .await
                .unwrap_or(Err(NarratorError::Timeout(self.attempt_timeout)));

            match result {
                Ok(value) => return RetryOutcome::Succeeded(value),
                Err(err) => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        "narrator attempt failed: {err}"
                    );
                    last_error = Some(err);
                }
            }

            if attempt + 1 < self.max_attempts {
                let delay = self.backoff(attempt);
                debug!(?delay, "backing off before next narrator attempt");
                tokio::time::sleep(delay).await;
            }
        }

        RetryOutcome::Exhausted {
            attempts: self.max_attempts,
            last_error,
        }
    }
}
