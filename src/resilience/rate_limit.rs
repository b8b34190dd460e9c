//! Rate limiting middleware backed by a shared token bucket.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::context::Context;
use crate::error::PoolError;
use crate::load_balancer::handle::Handle;
use crate::middleware::{Middleware, Next};

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take one token, or report how long until one is available.
    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = Duration::from_secs_f64((1.0 - self.tokens) / refill_rate);
            Err(wait.max(Duration::from_millis(1)))
        }
    }
}

/// Blocks each call until the shared bucket grants a token.
///
/// Clones share one bucket, so a single limiter can guard several pools.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    bucket: Arc<Mutex<TokenBucket>>,
    rps: f64,
    burst: f64,
    wait_timeout: Option<Duration>,
}

impl RateLimitMiddleware {
    /// `rps` tokens per second, bucket capacity `burst`. A zero `wait_timeout`
    /// waits without bound (the context deadline still applies).
    pub fn new(rps: u32, burst: u32, wait_timeout: Duration) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(burst))),
            rps: f64::from(rps.max(1)),
            burst,
            wait_timeout: (!wait_timeout.is_zero()).then_some(wait_timeout),
        }
    }

    /// Non-blocking acquire.
    pub fn try_acquire(&self) -> bool {
        self.poll_bucket().is_ok()
    }

    /// Wait until a token is granted.
    pub async fn acquire(&self) {
        while let Err(wait) = self.poll_bucket() {
            tokio::time::sleep(wait).await;
        }
    }

    fn poll_bucket(&self) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_acquire(self.burst, self.rps)
    }

    /// The tighter of the limiter's own wait timeout and the context deadline.
    fn wait_bound(&self, ctx: &Context) -> Option<WaitBound> {
        match (self.wait_timeout, ctx.remaining()) {
            (Some(limit), Some(remaining)) if remaining < limit => Some(WaitBound::Deadline(remaining)),
            (Some(limit), _) => Some(WaitBound::Limiter(limit)),
            (None, Some(remaining)) => Some(WaitBound::Deadline(remaining)),
            (None, None) => None,
        }
    }
}

/// What limits the wait for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitBound {
    Limiter(Duration),
    Deadline(Duration),
}

impl WaitBound {
    fn duration(self) -> Duration {
        match self {
            WaitBound::Limiter(d) | WaitBound::Deadline(d) => d,
        }
    }

    fn exceeded(self) -> PoolError {
        match self {
            WaitBound::Limiter(d) => PoolError::RateLimitTimeout(d),
            WaitBound::Deadline(d) => PoolError::DeadlineExceeded(d),
        }
    }
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for RateLimitMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        let bound = self.wait_bound(&ctx);
        let granted = async {
            match bound {
                Some(bound) => tokio::time::timeout(bound.duration(), self.acquire()).await.is_ok(),
                None => {
                    self.acquire().await;
                    true
                }
            }
        };

        tokio::select! {
            granted = granted => {
                if let (false, Some(bound)) = (granted, bound) {
                    tracing::warn!(client = %handle.id(), bound = ?bound, "Rate limit wait timed out");
                    return Err(bound.exceeded());
                }
            }
            _ = ctx.cancelled() => return Err(PoolError::Cancelled),
        }

        next.run(ctx, handle).await
    }

    fn name(&self) -> &'static str {
        "rate_limit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_refill() {
        let limiter = RateLimitMiddleware::new(10, 2, Duration::ZERO);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_millis(110)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_token() {
        let limiter = RateLimitMiddleware::new(10, 1, Duration::ZERO);
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(99));
    }

    #[test]
    fn test_wait_bound_prefers_tighter_limit() {
        let limiter = RateLimitMiddleware::new(1, 1, Duration::from_secs(2));
        assert_eq!(
            limiter.wait_bound(&Context::new()),
            Some(WaitBound::Limiter(Duration::from_secs(2)))
        );

        let ctx = Context::new().with_timeout(Duration::from_millis(500));
        assert!(matches!(
            limiter.wait_bound(&ctx),
            Some(WaitBound::Deadline(d)) if d <= Duration::from_millis(500)
        ));

        let unbounded = RateLimitMiddleware::new(1, 1, Duration::ZERO);
        assert_eq!(unbounded.wait_bound(&Context::new()), None);
        assert!(matches!(unbounded.wait_bound(&ctx), Some(WaitBound::Deadline(_))));
    }

    #[test]
    fn test_wait_bound_errors() {
        let limit = Duration::from_millis(100);
        assert!(matches!(WaitBound::Limiter(limit).exceeded(), PoolError::RateLimitTimeout(d) if d == limit));
        assert!(matches!(WaitBound::Deadline(limit).exceeded(), PoolError::DeadlineExceeded(d) if d == limit));
    }
}
