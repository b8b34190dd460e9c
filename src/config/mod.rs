//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientPoolConfig (validated, immutable)
//!     → ClientPool::from_settings + middleware::install_middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pool settings are fixed at construction
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, ClientPoolConfig, MiddlewareConfig, ObservabilityConfig, PoolSettings, RateLimitConfig,
    RetryConfig, TimeoutConfig, ToggleConfig,
};
pub use validation::ValidationError;
