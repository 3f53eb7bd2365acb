//! Retry configuration and backoff calculation.
//!
//! Portable, sync-only building blocks for retrying operations that hit
//! transient contention (the store wraps its SQLite writes with these):
//!
//! - [`RetryPolicy`]: Retry parameters (max retries, backoff step)
//! - [`RetryOutcome`]: Outcome of a retried operation
//! - [`linear_backoff_delay`]: Linear backoff (step × retry number)
//! - [`run`]: Execute an operation under a policy with an injectable sleep

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default maximum retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default backoff step in milliseconds.
pub const DEFAULT_BACKOFF_STEP_MS: u64 = 50;

/// Configuration for retry logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff step in ms; the nth retry waits `n × step` (default: 50).
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_backoff_step_ms() -> u64 {
    DEFAULT_BACKOFF_STEP_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step_ms: DEFAULT_BACKOFF_STEP_MS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a retried operation.
#[derive(Clone, Debug)]
pub struct RetryOutcome<T, E> {
    /// The final result: the first success, or the last error seen.
    pub result: Result<T, E>,
    /// Total number of attempts made (1-based, includes the initial attempt).
    pub attempts: u32,
    /// Total delay spent waiting in ms.
    pub total_delay_ms: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate a linear backoff delay.
///
/// Formula: `step_ms × retry`, where `retry` is the 1-based retry number
/// (1 for the first retry). With the default 50 ms step this yields
/// 50, 100, 150 ms for the three default retries.
#[must_use]
pub fn linear_backoff_delay(retry: u32, step_ms: u64) -> u64 {
    step_ms.saturating_mul(u64::from(retry))
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution
// ─────────────────────────────────────────────────────────────────────────────

/// Run `op` under `policy`, retrying errors that `is_retryable` accepts.
///
/// `sleep` receives each backoff delay; production callers pass
/// `std::thread::sleep`, tests pass a recorder. Non-retryable errors and
/// successes return immediately. The outcome always carries the number of
/// attempts actually made, so callers can report it when retries exhaust.
pub fn run<T, E, Op, Retryable, Sleep>(
    policy: &RetryPolicy,
    mut op: Op,
    mut is_retryable: Retryable,
    mut sleep: Sleep,
) -> RetryOutcome<T, E>
where
    Op: FnMut() -> Result<T, E>,
    Retryable: FnMut(&E) -> bool,
    Sleep: FnMut(Duration),
{
    let mut attempts = 0u32;
    let mut total_delay_ms = 0u64;

    loop {
        attempts += 1;
        match op() {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                    total_delay_ms,
                };
            }
            Err(err) => {
                let retries_used = attempts - 1;
                if retries_used >= policy.max_retries || !is_retryable(&err) {
                    return RetryOutcome {
                        result: Err(err),
                        attempts,
                        total_delay_ms,
                    };
                }
                let delay_ms = linear_backoff_delay(retries_used + 1, policy.backoff_step_ms);
                total_delay_ms = total_delay_ms.saturating_add(delay_ms);
                sleep(Duration::from_millis(delay_ms));
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
