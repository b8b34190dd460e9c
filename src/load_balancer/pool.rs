//! Client pool management.
//!
//! # Responsibilities
//! - Own the insertion-ordered list of client handles
//! - Apply a selection strategy per call
//! - Run the middleware chain around the caller's operation
//! - Record exactly one outcome per call on the selected handle

use arc_swap::ArcSwap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use crate::config::PoolSettings;
use crate::context::Context;
use crate::error::{BoxError, PoolError};
use crate::load_balancer::{
    handle::{Handle, HandleStatus},
    random::Random,
    round_robin::RoundRobin,
    weighted_random::WeightedRandom,
    LoadBalancer, Strategy,
};
use crate::middleware::{Middleware, Next, RecoveryMiddleware};

/// A pool of interchangeable clients of type `T`.
pub struct ClientPool<T> {
    handles: RwLock<Vec<Arc<Handle<T>>>>,
    round_robin: RoundRobin,
    random: Random,
    weighted_random: WeightedRandom,
    max_fails: u32,
    cooldown: Duration,
    default_strategy: Strategy,
    /// Snapshot of the chain; executions load it without locking.
    chain: ArcSwap<Vec<Arc<dyn Middleware<T>>>>,
}

impl<T: Send + Sync + 'static> ClientPool<T> {
    /// Create a pool. `max_fails` of zero is treated as one.
    ///
    /// A [`RecoveryMiddleware`] is always registered first, so it is the outermost layer.
    pub fn new(max_fails: u32, cooldown: Duration, default_strategy: Strategy) -> Self {
        if max_fails == 0 {
            tracing::warn!("max_fails of 0 is invalid, using 1");
        }
        let pool = Self {
            handles: RwLock::new(Vec::new()),
            round_robin: RoundRobin::new(),
            random: Random::new(),
            weighted_random: WeightedRandom::new(),
            max_fails: max_fails.max(1),
            cooldown,
            default_strategy,
            chain: ArcSwap::from_pointee(Vec::new()),
        };
        pool.register_middleware(RecoveryMiddleware::new());
        pool
    }

    /// Create a pool from configuration settings.
    pub fn from_settings(settings: &PoolSettings) -> Self {
        Self::new(settings.max_fails, settings.cooldown(), settings.default_strategy)
    }

    /// Append a client. Weights of zero or below are treated as 1.
    pub fn add_client(&self, client: T, id: impl Into<String>, weight: i32) {
        let handle = Arc::new(Handle::new(client, id, weight));
        tracing::info!(client = %handle.id(), weight = handle.weight(), "Client added to pool");

        self.handles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Append a middleware. Registration order is call order: earlier
    /// middlewares wrap later ones.
    pub fn register_middleware<M>(&self, middleware: M)
    where
        M: Middleware<T> + 'static,
    {
        self.register_shared(Arc::new(middleware));
    }

    /// Append an already shared middleware.
    pub fn register_shared(&self, middleware: Arc<dyn Middleware<T>>) {
        tracing::debug!(middleware = middleware.name(), "Middleware registered");
        self.chain.rcu(|chain| {
            let mut next = Vec::clone(chain);
            next.push(middleware.clone());
            next
        });
    }

    /// Run `op` on a client chosen by the default strategy.
    pub async fn execute<F, Fut>(&self, ctx: Context, op: F) -> Result<(), PoolError>
    where
        F: Fn(Context, Arc<T>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        self.execute_with(ctx, self.default_strategy, op).await
    }

    pub async fn execute_round_robin<F, Fut>(&self, ctx: Context, op: F) -> Result<(), PoolError>
    where
        F: Fn(Context, Arc<T>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        self.execute_with(ctx, Strategy::RoundRobin, op).await
    }

    pub async fn execute_random<F, Fut>(&self, ctx: Context, op: F) -> Result<(), PoolError>
    where
        F: Fn(Context, Arc<T>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        self.execute_with(ctx, Strategy::Random, op).await
    }

    pub async fn execute_weighted_random<F, Fut>(&self, ctx: Context, op: F) -> Result<(), PoolError>
    where
        F: Fn(Context, Arc<T>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        self.execute_with(ctx, Strategy::WeightedRandom, op).await
    }

    /// Select a client with `strategy`, run the chain and `op` against it, and
    /// record the outcome on that client.
    ///
    /// Selection failure returns [`PoolError::NoAvailableClient`] without
    /// running any middleware.
    pub async fn execute_with<F, Fut>(&self, ctx: Context, strategy: Strategy, op: F) -> Result<(), PoolError>
    where
        F: Fn(Context, Arc<T>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        let handle = self.select(strategy)?;
        let chain = self.chain.load_full();

        let result = Next::new(&chain, &op).run(ctx, &handle).await;

        match &result {
            Ok(()) => handle.mark_success(),
            Err(err) => {
                if handle.mark_fail(self.max_fails) {
                    tracing::warn!(
                        client = %handle.id(),
                        max_fails = self.max_fails,
                        cooldown = ?self.cooldown,
                        error = %err,
                        "Client tripped"
                    );
                } else {
                    tracing::debug!(client = %handle.id(), error = %err, "Call failed");
                }
            }
        }
        result
    }

    /// Pick a client without running anything. The pool lock is released before returning.
    pub fn select(&self, strategy: Strategy) -> Result<Arc<Handle<T>>, PoolError> {
        let handles = self.handles();
        let selected = self.balancer(strategy).next_client(&handles, self.cooldown);

        selected.ok_or_else(|| {
            tracing::debug!(strategy = %strategy, client_count = handles.len(), "No available client");
            PoolError::NoAvailableClient
        })
    }

    /// Snapshot of every handle, in insertion order.
    pub fn status(&self) -> Vec<HandleStatus> {
        self.handles().iter().map(|h| h.status()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles().is_empty()
    }

    /// Number of registered middlewares, including the built-in recovery.
    pub fn middleware_count(&self) -> usize {
        self.chain.load().len()
    }

    /// Names of the registered middlewares, outermost first.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.chain.load().iter().map(|m| m.name()).collect()
    }

    pub fn max_fails(&self) -> u32 {
        self.max_fails
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    fn balancer(&self, strategy: Strategy) -> &dyn LoadBalancer<T> {
        match strategy {
            Strategy::RoundRobin => &self.round_robin,
            Strategy::WeightedRandom => &self.weighted_random,
            Strategy::Random => &self.random,
        }
    }

    fn handles(&self) -> RwLockReadGuard<'_, Vec<Arc<Handle<T>>>> {
        self.handles.read().unwrap_or_else(PoisonError::into_inner)
    }
}
