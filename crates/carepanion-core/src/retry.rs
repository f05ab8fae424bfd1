//! Retry policy for ledger submissions.
//!
//! A single `RetryPolicy` value replaces per-call-site retry loops. The policy
//! only decides; the coordinator owns the loop and the sleeping.
//!
//! A ledger write is not idempotent: two accepted submissions are two on-chain
//! records. The default predicate therefore only admits `ChainUnavailable`.

use std::time::Duration;

use crate::errors::AttestError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first. `1` disables retries.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Exponential growth factor applied per attempt.
    pub multiplier: u32,
    pub retryable: fn(&AttestError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            multiplier: 2,
            retryable: AttestError::is_retryable,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let factor = self.multiplier.max(1).saturating_pow(exp);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Whether to try again after `attempt` (1-based) failed with `err`.
    pub fn should_retry(&self, attempt: u32, err: &AttestError) -> bool {
        attempt < self.max_attempts && (self.retryable)(err)
    }
}
