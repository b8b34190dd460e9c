//! Error definitions shared by the pool and its middleware.

use std::time::Duration;
use thiserror::Error;

/// Error type returned by pooled operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`ClientPool`](crate::ClientPool) executions.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Selection found no usable client (empty pool, or every candidate tripped).
    #[error("no available client")]
    NoAvailableClient,

    /// The operation itself failed.
    #[error("operation failed: {0}")]
    Operation(#[source] BoxError),

    /// A panic was caught by the recovery middleware.
    #[error("panic recovered: {0}")]
    PanicRecovered(String),

    /// The rate limiter did not grant a token in time.
    #[error("rate limiter wait timed out after {0:?}")]
    RateLimitTimeout(Duration),

    /// The call context was cancelled.
    #[error("context canceled")]
    Cancelled,

    /// The call exceeded its deadline.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl PoolError {
    /// True when the error came from selection rather than from a call.
    pub fn is_no_available_client(&self) -> bool {
        matches!(self, PoolError::NoAvailableClient)
    }
}
