use std::time::Duration;

use thiserror::Error;

use crate::error::CollaboratorError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2_000);

/// Bounded exponential backoff for a single collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// The last error seen once the policy gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryExhausted {
    pub attempts: u32,
    #[source]
    pub error: CollaboratorError,
}

impl RetryPolicy {
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1`, given `attempt` failures so far.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. A zero `max_attempts` still makes one call.
    pub fn run<T>(
        &self,
        mut operation: impl FnMut() -> Result<T, CollaboratorError>,
    ) -> Result<T, RetryExhausted> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if error.retryable && attempt < max_attempts => {
                    tracing::debug!(
                        attempt,
                        max_attempts,
                        error = %error,
                        "retrying collaborator call"
                    );
                    let delay = self.backoff(attempt);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(error) => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        error,
                    })
                }
            }
        }
    }
}
