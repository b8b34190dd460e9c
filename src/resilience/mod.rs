//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Pooled call:
//!     → rate_limit.rs (wait for a token, bounded)
//!     → retries.rs (re-invoke downstream with a fixed delay)
//!     → timeouts.rs (bound each downstream attempt)
//!     → operation
//!     → circuit_breaker.rs (pool records the single outcome per call)
//! ```
//!
//! # Design Decisions
//! - Rate limit, retry and timeout are ordinary middlewares and opt-in
//! - The circuit breaker is not a middleware: it lives on each handle and is
//!   updated by the pool after the chain returns

pub mod circuit_breaker;
pub mod rate_limit;
pub mod retries;
pub mod timeouts;

pub use rate_limit::RateLimitMiddleware;
pub use retries::RetryMiddleware;
pub use timeouts::TimeoutMiddleware;
