//! Config-driven middleware installation.

use std::sync::Arc;
use std::time::Duration;

use crate::config::MiddlewareConfig;
use crate::load_balancer::pool::ClientPool;
use crate::middleware::{MetricsMiddleware, TraceMiddleware};
use crate::observability::metrics::MetricsCollector;
use crate::resilience::{RateLimitMiddleware, RetryMiddleware, TimeoutMiddleware};

/// Register the enabled middlewares on `pool`.
///
/// Order after the built-in recovery: trace, metrics, rate limit, retry,
/// timeout. Timeout is innermost so it bounds each retry attempt rather than
/// the whole retry loop.
///
/// Returns the metrics collector when metrics are enabled.
pub fn install_middleware<T>(pool: &ClientPool<T>, config: &MiddlewareConfig) -> Option<Arc<MetricsCollector>>
where
    T: Send + Sync + 'static,
{
    if config.trace.enabled {
        pool.register_middleware(TraceMiddleware::new());
    }

    let collector = config.metrics.enabled.then(|| Arc::new(MetricsCollector::new()));
    if let Some(collector) = &collector {
        pool.register_middleware(MetricsMiddleware::new(collector.clone()));
    }

    if config.rate_limit.enabled {
        let rl = &config.rate_limit;
        pool.register_middleware(RateLimitMiddleware::new(
            rl.rps,
            rl.burst,
            Duration::from_millis(rl.wait_timeout_ms),
        ));
    }

    if config.retry.enabled {
        pool.register_middleware(RetryMiddleware::new(
            config.retry.attempts,
            Duration::from_millis(config.retry.delay_ms),
        ));
    }

    if config.timeout.enabled {
        pool.register_middleware(TimeoutMiddleware::new(Duration::from_millis(config.timeout.timeout_ms)));
    }

    tracing::info!(middlewares = pool.middleware_count(), "Middleware stack installed");
    collector
}
