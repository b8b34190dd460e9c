//! Call metrics middleware.
//!
//! Counts the call before `next`, then records its duration and, on error,
//! the error counter. Labels are the client id and the context's method label.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::context::Context;
use crate::error::PoolError;
use crate::load_balancer::handle::Handle;
use crate::middleware::{Middleware, Next};
use crate::observability::metrics::MetricsCollector;

#[derive(Debug, Clone)]
pub struct MetricsMiddleware {
    collector: Arc<MetricsCollector>,
}

impl MetricsMiddleware {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for MetricsMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        let method = ctx.method().map(str::to_owned);
        self.collector.record_call(handle.id(), method.as_deref());

        let start = Instant::now();
        let result = next.run(ctx, handle).await;
        self.collector
            .record_outcome(handle.id(), method.as_deref(), start.elapsed(), result.is_err());

        result
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}
