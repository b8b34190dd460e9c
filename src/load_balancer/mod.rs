//! Client selection subsystem.
//!
//! # Data Flow
//! ```text
//! ClientPool::execute_with(strategy)
//!     → pool.rs (take read lock on the handle list)
//!     → Apply selection algorithm:
//!         - round_robin.rs (rotate a shared cursor)
//!         - random.rs (one uniform draw)
//!         - weighted_random.rs (draw proportional to weight)
//!     → handle.rs (lazily recover expired trips while scanning)
//!     → Release lock, return the selected handle or NoAvailableClient
//! ```
//!
//! # Design Decisions
//! - Selectors never block; the lock is held for the scan only
//! - Tripped handles are excluded from selection
//! - Weight only biases probability, it never affects failure accounting

pub mod handle;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod weighted_random;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::load_balancer::handle::Handle;

/// A client selection algorithm over handles of `T`.
pub trait LoadBalancer<T>: Send + Sync + fmt::Debug {
    /// Pick one available client, or `None` if nothing qualifies.
    fn next_client(&self, clients: &[Arc<Handle<T>>], cooldown: Duration) -> Option<Arc<Handle<T>>>;
}

/// Selection strategy requested for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    WeightedRandom,
    Random,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round_robin",
            Strategy::WeightedRandom => "weighted_random",
            Strategy::Random => "random",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown strategy name.
#[derive(Debug, Error)]
#[error("unknown strategy '{0}' (expected round_robin, weighted_random or random)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "round_robin" | "rr" => Ok(Strategy::RoundRobin),
            "weighted_random" | "weighted" => Ok(Strategy::WeightedRandom),
            "random" => Ok(Strategy::Random),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}
