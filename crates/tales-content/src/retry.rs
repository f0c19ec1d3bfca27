//! Bounded retry with exponential backoff
//!
//! Attempts run strictly one after another. After failed attempt `i`
//! (0-based) the loop sleeps `base_delay * 2^i` before the next one, so the
//! defaults (3 attempts, 1s) wait 1s then 2s.

use std::future::Future;
use std::time::Duration;

use tales_core::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS};
use tales_storage::StorageError;

use crate::error::ContentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay after failed attempt `attempt_index` (0-based).
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// Errors that `StorageError::is_retryable` marks as permanent end the
    /// loop early. Either way the last error is returned as
    /// `ContentError::TransientIo` with the number of attempts made.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T, ContentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let attempts = self.attempts();
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(operation, attempt = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let made = attempt + 1;
                    if made >= attempts || !err.is_retryable() {
                        tracing::warn!(
                            operation,
                            attempts = made,
                            retryable = err.is_retryable(),
                            error = %err,
                            "Giving up"
                        );
                        return Err(ContentError::TransientIo {
                            operation,
                            attempts: made,
                            source: err,
                        });
                    }

                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt = made,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
