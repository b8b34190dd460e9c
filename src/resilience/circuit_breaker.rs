//! Per-client circuit breaker.
//!
//! # States
//! - Available: the client is eligible for selection
//! - Tripped: the client is excluded from selection
//!
//! # State Transitions
//! ```text
//! Available → Available: failure, consecutive_failures < max_fails
//! Available → Tripped:   failure, consecutive_failures reaches max_fails
//! Tripped   → Available: cooldown elapsed AND a selector examines the client
//! any       → Available: success (counters zeroed)
//! ```
//!
//! # Design Decisions
//! - Per-client breaker, never global
//! - Recovery is pull-based: there is no timer, a tripped client that is never
//!   scanned stays tripped
//! - Counters are resettable, so concurrent last-writer-wins updates are fine

use std::time::Duration;
use tokio::time::Instant;

/// Failure-tracking state of one client.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    tripped: bool,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Returns true if this failure tripped the breaker.
    pub fn record_failure(&mut self, max_fails: u32, now: Instant) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure = Some(now);

        let was_tripped = self.tripped;
        if self.consecutive_failures >= max_fails {
            self.tripped = true;
        }
        self.tripped && !was_tripped
    }

    /// Record a success; closes the breaker and zeroes the counters.
    pub fn record_success(&mut self) {
        self.reset();
    }

    /// Reset to Available if tripped and the cooldown has strictly elapsed.
    /// Returns true if a reset happened.
    pub fn try_recover(&mut self, cooldown: Duration, now: Instant) -> bool {
        if !self.tripped {
            return false;
        }
        let expired = match self.last_failure {
            Some(at) => now.saturating_duration_since(at) > cooldown,
            None => true,
        };
        if expired {
            self.reset();
        }
        expired
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }

    fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.tripped = false;
    }
}
