//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool and middlewares produce:
//!     → tracing events and spans (logging.rs installs the subscriber)
//!     → metrics.rs (counters, histograms) via MetricsMiddleware
//!
//! Consumers:
//!     → stderr log output
//!     → MetricsCollector::render (Prometheus text)
//! ```
//!
//! # Design Decisions
//! - Trace id flows through the call context (middleware::trace)
//! - Metrics collectors are explicit objects, never process-global

pub mod logging;
pub mod metrics;

pub use self::metrics::MetricsCollector;
