//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a client pool.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::load_balancer::Strategy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientPoolConfig {
    /// Pool construction settings.
    pub pool: PoolSettings,

    /// Optional middleware stack.
    pub middleware: MiddlewareConfig,

    /// Client definitions.
    pub clients: Vec<ClientConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Pool construction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Consecutive failures before a client is tripped.
    pub max_fails: u32,

    /// Time a tripped client waits before it may be selected again, in milliseconds.
    pub cooldown_ms: u64,

    /// Strategy used by `ClientPool::execute`.
    pub default_strategy: Strategy,
}

impl PoolSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_fails: 3,
            cooldown_ms: 5_000,
            default_strategy: Strategy::RoundRobin,
        }
    }
}

/// Client definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Unique client identifier, used in logs and metric labels.
    pub id: String,

    /// Weight for weighted random selection (default: 1, values below 1 become 1).
    #[serde(default = "default_weight")]
    pub weight: i32,
}

fn default_weight() -> i32 {
    1
}

/// Middleware stack. Everything is disabled by default.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub trace: ToggleConfig,
    pub metrics: ToggleConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub timeout: TimeoutConfig,
}

/// On/off switch for middlewares without parameters.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ToggleConfig {
    pub enabled: bool,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Tokens added per second.
    pub rps: u32,

    /// Bucket capacity.
    pub burst: u32,

    /// Maximum wait for a token in milliseconds (0 = wait indefinitely).
    pub wait_timeout_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rps: 100,
            burst: 200,
            wait_timeout_ms: 1_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Total attempts, including the first one.
    pub attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts: 6,
            delay_ms: 200,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Enable the per-call timeout.
    pub enabled: bool,

    /// Timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
