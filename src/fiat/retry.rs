//! Bounded retries with a fixed backoff and cooperative cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::constants::price_queries::{MAX_ATTEMPTS, RETRY_BACKOFF_SECS};
use crate::error::{LedgerError, Result};

/// How often, and how patiently, a query is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Sleep between consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: Duration::from_secs(RETRY_BACKOFF_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// Cancelling `cancel` aborts both an in-flight attempt and the backoff
    /// sleep, returning [`LedgerError::ShuttingDown`].
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last = String::new();

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(LedgerError::ShuttingDown);
            }
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LedgerError::ShuttingDown),
                outcome = op() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max = self.max_attempts,
                        error = %err,
                        "price query failed"
                    );
                    last = err.to_string();
                }
            }

            if attempt < self.max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LedgerError::ShuttingDown),
                    _ = tokio::time::sleep(self.backoff) => {}
                }
            }
        }

        Err(LedgerError::RetriesExhausted {
            attempts: self.max_attempts,
            last,
        })
    }
}
