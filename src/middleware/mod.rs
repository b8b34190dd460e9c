//! Middleware chain.
//!
//! # Data Flow
//! ```text
//! chain = [Recovery, A, B, C]   (registration order)
//!
//! Recovery ─▶ A ─▶ B ─▶ C ─▶ operation(ctx, client)
//! Recovery ◀─ A ◀─ B ◀─ C ◀─ Result
//! ```
//!
//! # Design Decisions
//! - The first registered middleware is outermost, the last is innermost
//! - `Next` is a borrowed cursor over the chain snapshot; nothing is rebuilt per call
//! - A middleware may skip `next` (short-circuit) or call it repeatedly (retry)
//! - Recovery is installed first by the pool so it covers everything downstream

pub mod metrics;
pub mod recovery;
pub mod stack;
pub mod trace;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{BoxError, PoolError};
use crate::load_balancer::handle::Handle;

pub use self::metrics::MetricsMiddleware;
pub use self::recovery::RecoveryMiddleware;
pub use self::stack::install_middleware;
pub use self::trace::TraceMiddleware;

/// A cross-cutting step wrapped around every pooled call.
#[async_trait]
pub trait Middleware<T>: Send + Sync {
    /// Run this step. Call `next.run(ctx, handle)` to continue down the chain.
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// The user operation at the bottom of the chain.
///
/// Implemented for any `Fn(Context, Arc<T>) -> impl Future<Output = Result<(), BoxError>>`.
pub trait Operation<'o, T>: Send + Sync {
    fn call(&self, ctx: Context, client: Arc<T>) -> BoxFuture<'o, Result<(), BoxError>>;
}

impl<'o, T, F, Fut> Operation<'o, T> for F
where
    F: Fn(Context, Arc<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'o,
{
    fn call(&self, ctx: Context, client: Arc<T>) -> BoxFuture<'o, Result<(), BoxError>> {
        Box::pin(self(ctx, client))
    }
}

/// The remainder of the chain, as seen from one middleware.
pub struct Next<'n, T> {
    chain: &'n [Arc<dyn Middleware<T>>],
    op: &'n dyn Operation<'n, T>,
}

impl<T> Clone for Next<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Next<'_, T> {}

impl<'n, T> Next<'n, T> {
    pub(crate) fn new(chain: &'n [Arc<dyn Middleware<T>>], op: &'n dyn Operation<'n, T>) -> Self {
        Self { chain, op }
    }

    /// Number of middlewares still ahead of the operation.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

impl<'n, T: Send + Sync> Next<'n, T> {
    /// Invoke the rest of the chain, ending with the operation.
    pub fn run<'r>(self, ctx: Context, handle: &'r Handle<T>) -> BoxFuture<'r, Result<(), PoolError>>
    where
        'n: 'r,
    {
        match self.chain.split_first() {
            Some((middleware, rest)) => middleware.execute(ctx, handle, Next { chain: rest, op: self.op }),
            // The operation is created inside the future so that a panic while
            // building it still unwinds through the outer middlewares.
            None => Box::pin(async move {
                self.op
                    .call(ctx, handle.client())
                    .await
                    .map_err(PoolError::Operation)
            }),
        }
    }
}
