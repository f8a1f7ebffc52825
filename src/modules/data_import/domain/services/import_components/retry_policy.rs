//! Bounded retry for chunk-level persistence calls
//!
//! Only chunk round-trips are retried. Per-record fallbacks and enrichment
//! lookups never go through this policy.

use crate::shared::errors::AppResult;
use crate::{log_debug, log_warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Linear backoff retry policy for transient chunk failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `n * base_delay`
    pub base_delay: Duration,
}

impl Default for ChunkRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl ChunkRetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// No retries at all; the first transient failure is final
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Run `operation` until it succeeds, fails with a non-transient error, or
    /// the retry budget is spent. The last error is returned unchanged.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if retry > 0 {
                        log_debug!("{} succeeded after {} retries", operation_name, retry);
                    }
                    return Ok(value);
                }
                Err(error) if error.is_transient() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    log_warn!(
                        "{} failed with transient error (retry {}/{}): {}. Waiting {:?}",
                        operation_name,
                        retry,
                        self.max_retries,
                        error,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
