//! Trace identifier propagation.
//!
//! Reuses the trace id already present in the context or generates a UUID v4,
//! stores it in the context passed downstream, and runs the rest of the chain
//! inside a span carrying the trace id and client id.

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use crate::context::Context;
use crate::error::PoolError;
use crate::load_balancer::handle::Handle;
use crate::middleware::{Middleware, Next};

#[derive(Debug, Default, Clone, Copy)]
pub struct TraceMiddleware;

impl TraceMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for TraceMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        let ctx = match ctx.trace_id() {
            Some(_) => ctx,
            None => ctx.with_trace_id(Uuid::new_v4().to_string()),
        };
        let trace_id = ctx.trace_id().unwrap_or_default().to_string();
        let span = tracing::info_span!("pool_call", trace_id = %trace_id, client = %handle.id());

        async move {
            tracing::debug!("call start");
            let result = next.run(ctx, handle).await;
            match &result {
                Ok(()) => tracing::debug!("call end"),
                Err(e) => tracing::debug!(error = %e, "call end"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}
