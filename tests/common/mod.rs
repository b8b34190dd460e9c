//! Shared utilities for pool integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use client_pool::{BoxError, ClientPool, Context, Handle, Middleware, Next, PoolError, Strategy};

/// A pooled test double that counts calls and fails on demand.
#[derive(Debug)]
pub struct TestClient {
    pub id: String,
    failing: AtomicBool,
    calls: AtomicU32,
}

impl TestClient {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            failing: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(id: &str) -> Self {
        let client = Self::new(id);
        client.set_failing(true);
        client
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn call(&self) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(format!("{} is down", self.id).into())
        } else {
            Ok(())
        }
    }
}

/// Pool of `TestClient`s with the given `(id, weight)` pairs.
pub fn pool_of(clients: &[(&str, i32)], max_fails: u32, cooldown: Duration) -> ClientPool<TestClient> {
    let pool = ClientPool::new(max_fails, cooldown, Strategy::RoundRobin);
    for (id, weight) in clients {
        pool.add_client(TestClient::new(id), *id, *weight);
    }
    pool
}

/// Run one call and return the id of the client that served it.
pub async fn call_recording(pool: &ClientPool<TestClient>, strategy: Strategy) -> Result<String, PoolError> {
    let served = Mutex::new(None);
    let served_ref = &served;
    pool.execute_with(Context::new(), strategy, move |_ctx, client: Arc<TestClient>| async move {
        *served_ref.lock().unwrap() = Some(client.id.clone());
        client.call().await
    })
    .await?;
    Ok(served.into_inner().unwrap().unwrap_or_default())
}

/// Shared event log for middleware ordering assertions.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Logs `<label>:in` before and `<label>:out` after the rest of the chain.
pub struct RecordingMiddleware {
    pub label: &'static str,
    pub log: EventLog,
}

#[async_trait]
impl<T: Send + Sync> Middleware<T> for RecordingMiddleware {
    async fn execute(&self, ctx: Context, handle: &Handle<T>, next: Next<'_, T>) -> Result<(), PoolError> {
        self.log.push(format!("{}:in", self.label));
        let result = next.run(ctx, handle).await;
        self.log.push(format!("{}:out", self.label));
        result
    }
}
