use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single failed attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub attempt: u8,
    /// Error message from the failed attempt.
    pub error: String,
    /// When this attempt occurred.
    pub timestamp: DateTime<Utc>,
}

impl RetryAttempt {
    pub fn new(attempt: u8, error: impl Into<String>) -> Self {
        Self {
            attempt,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone)]
pub enum RetryDecision {
    /// Try again after `delay`.
    Retry { attempt: u8, delay: Duration },
    /// Out of attempts; `history` lists every failure.
    Exhausted { history: Vec<RetryAttempt> },
}

/// Bounds for an optimistic operation that may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first one.
    pub max_attempts: u8,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 10,
            max_delay_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// Start tracking a new operation under this policy.
    pub fn start(&self) -> RetryBudget {
        RetryBudget {
            policy: *self,
            history: Vec::new(),
        }
    }
}

/// Failure history of one operation, checked against its [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    history: Vec<RetryAttempt>,
}

impl RetryBudget {
    /// Record a failed attempt and decide whether another one is allowed.
    pub fn record_failure(&mut self, error: impl Into<String>) -> RetryDecision {
        let attempt = self.history.len().saturating_add(1).min(u8::MAX as usize) as u8;
        self.history.push(RetryAttempt::new(attempt, error));

        if attempt < self.policy.max_attempts.max(1) {
            RetryDecision::Retry {
                attempt,
                delay: calculate_backoff(
                    attempt,
                    self.policy.base_delay_ms,
                    self.policy.max_delay_ms,
                ),
            }
        } else {
            RetryDecision::Exhausted {
                history: std::mem::take(&mut self.history),
            }
        }
    }

    /// Number of failures recorded so far.
    pub fn failures(&self) -> usize {
        self.history.len()
    }
}

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    let total_delay = delay_ms.saturating_add(jitter).min(max_ms);
    Duration::from_millis(total_delay)
}
