//! Timeout middleware.
//!
//! # Responsibilities
//! - Derive a bounded child context for everything downstream
//! - Abandon the downstream call once the bound elapses
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - The child cancellation token is cancelled on expiry so work the operation
//!   spawned can observe it
//! - An earlier deadline already on the context wins

use async_trait::async_trait;
use std::time::Duration;

use crate::context::Context;
use crate::error::PoolError;
use crate::load_balancer::handle::Handle;
use crate::middleware::{Middleware, Next};

#[derive(Debug, Clone, Copy)]
pub struct TimeoutMiddleware {
    timeout: Duration,
}

impl TimeoutMiddleware {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for TimeoutMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        let bounded = ctx.child_with_timeout(self.timeout);
        let limit = bounded.remaining().unwrap_or(self.timeout);
        let token = bounded.cancellation_token().clone();

        match tokio::time::timeout(limit, next.run(bounded, handle)).await {
            Ok(result) => result,
            Err(_) => {
                token.cancel();
                tracing::warn!(client = %handle.id(), timeout = ?limit, "Call timed out");
                Err(PoolError::DeadlineExceeded(limit))
            }
        }
    }

    fn name(&self) -> &'static str {
        "timeout"
    }
}
