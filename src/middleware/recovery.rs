//! Panic recovery.
//!
//! Converts a panic anywhere downstream into [`PoolError::PanicRecovered`]
//! so the calling task keeps running and the call is recorded as a failure.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::context::Context;
use crate::error::PoolError;
use crate::load_balancer::handle::Handle;
use crate::middleware::{Middleware, Next};

/// Catches panics raised by inner middlewares or the operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryMiddleware;

impl RecoveryMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for RecoveryMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        // `next.run` may panic before it returns a future; call it under the guard.
        let downstream = async move { next.run(ctx, handle).await };
        match AssertUnwindSafe(downstream).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(client = %handle.id(), panic = %message, "Panic recovered");
                Err(PoolError::PanicRecovered(message))
            }
        }
    }

    fn name(&self) -> &'static str {
        "recovery"
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
