//! Generic client pool with load balancing, per-client circuit breaking and a
//! middleware chain.
//!
//! ```no_run
//! use std::time::Duration;
//! use client_pool::{ClientPool, Context, Strategy};
//!
//! # async fn demo() -> Result<(), client_pool::PoolError> {
//! let pool = ClientPool::new(3, Duration::from_secs(5), Strategy::RoundRobin);
//! pool.add_client("http://node-a".to_string(), "node-a", 1);
//! pool.add_client("http://node-b".to_string(), "node-b", 2);
//!
//! pool.execute(Context::new(), |_ctx, url| async move {
//!     println!("calling {url}");
//!     Ok(())
//! })
//! .await
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod load_balancer;
pub mod middleware;
pub mod observability;
pub mod resilience;

pub use config::ClientPoolConfig;
pub use context::Context;
pub use error::{BoxError, PoolError};
pub use load_balancer::handle::{Handle, HandleStatus};
pub use load_balancer::pool::ClientPool;
pub use load_balancer::Strategy;
pub use middleware::{install_middleware, Middleware, Next};
pub use observability::MetricsCollector;
