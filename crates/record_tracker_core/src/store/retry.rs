//! Bounded retries for store calls.
//!
//! # Invariants
//! - Non-retryable kinds return on the first failure.
//! - At least one attempt is made even when `max_attempts` is zero.

use super::error::StoreResult;
use log::warn;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Retry budget for transient store failures.
///
/// The default makes exactly one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_backoff_ms: 120,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            base_backoff_ms,
        }
    }

    /// Linear backoff before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Runs `op` until it succeeds, fails permanently, or the budget is spent.
    pub fn run<T>(&self, op_name: &str, mut op: impl FnMut() -> StoreResult<T>) -> StoreResult<T> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        "event=store_retry module=store op={op_name} attempt={attempt} max_attempts={max_attempts} delay_ms={} error_kind={}",
                        delay.as_millis(),
                        err.kind.as_str()
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
