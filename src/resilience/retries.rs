//! Retry middleware.
//!
//! # Responsibilities
//! - Re-invoke the rest of the chain on failure, up to a fixed attempt count
//! - Wait a fixed delay between attempts
//! - Surface only the last error
//!
//! # Design Decisions
//! - Retries are invisible to breaker accounting: the pool records one outcome
//! - A cancelled context stops further attempts

use async_trait::async_trait;
use std::time::Duration;

use crate::context::Context;
use crate::error::PoolError;
use crate::load_balancer::handle::Handle;
use crate::middleware::{Middleware, Next};

pub const DEFAULT_ATTEMPTS: u32 = 6;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct RetryMiddleware {
    attempts: u32,
    delay: Duration,
}

impl RetryMiddleware {
    /// `attempts` counts the first call; zero is treated as one.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for RetryMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for RetryMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        let mut attempt = 1;
        loop {
            match next.run(ctx.clone(), handle).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt >= self.attempts || ctx.is_cancelled() => return Err(err),
                Err(err) => {
                    tracing::debug!(
                        client = %handle.id(),
                        attempt,
                        max_attempts = self.attempts,
                        delay = ?self.delay,
                        error = %err,
                        "Retrying call"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.delay) => {}
                        _ = ctx.cancelled() => return Err(err),
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}
