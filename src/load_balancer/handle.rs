//! Client handle abstraction.
//!
//! # Responsibilities
//! - Own a single pooled client together with its identity and weight
//! - Track consecutive failures through a per-handle circuit breaker
//! - Serialize breaker updates with a handle-local lock, so unrelated
//!   handles never contend

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::resilience::circuit_breaker::CircuitBreaker;

/// A single pooled client.
pub struct Handle<T> {
    id: String,
    client: Arc<T>,
    weight: u32,
    breaker: Mutex<CircuitBreaker>,
}

/// Point-in-time view of a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandleStatus {
    pub id: String,
    pub weight: u32,
    pub consecutive_failures: u32,
    pub tripped: bool,
}

impl<T> Handle<T> {
    /// Create a new handle. Weights below 1 are coerced to 1.
    pub fn new(client: T, id: impl Into<String>, weight: i32) -> Self {
        let weight = u32::try_from(weight).ok().filter(|w| *w > 0).unwrap_or(1);
        Self {
            id: id.into(),
            client: Arc::new(client),
            weight,
            breaker: Mutex::new(CircuitBreaker::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Shared reference to the underlying client.
    pub fn client(&self) -> Arc<T> {
        self.client.clone()
    }

    /// Report a failed call. Returns true if this failure tripped the handle.
    pub fn mark_fail(&self, max_fails: u32) -> bool {
        self.breaker().record_failure(max_fails, Instant::now())
    }

    /// Report a successful call.
    pub fn mark_success(&self) {
        self.breaker().record_success();
    }

    /// True unless the breaker is tripped. Does not apply cooldown.
    pub fn is_available(&self) -> bool {
        !self.breaker().is_tripped()
    }

    /// Selector-side check: lazily closes an expired breaker, then reports
    /// availability. Both steps happen under one lock acquisition.
    pub fn is_available_after(&self, cooldown: Duration) -> bool {
        let mut breaker = self.breaker();
        if breaker.try_recover(cooldown, Instant::now()) {
            tracing::info!(client = %self.id, "Client recovered after cooldown");
        }
        !breaker.is_tripped()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.breaker().consecutive_failures()
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.breaker().last_failure()
    }

    pub fn status(&self) -> HandleStatus {
        let breaker = self.breaker();
        HandleStatus {
            id: self.id.clone(),
            weight: self.weight,
            consecutive_failures: breaker.consecutive_failures(),
            tripped: breaker.is_tripped(),
        }
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("breaker", &*self.breaker())
            .finish_non_exhaustive()
    }
}
