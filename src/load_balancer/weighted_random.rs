//! Weighted random selection strategy.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::{handle::Handle, LoadBalancer};

/// Weighted random selector.
/// Every client is examined (so expired trips are reset), then one available
/// client is drawn with probability proportional to its weight.
#[derive(Debug, Default)]
pub struct WeightedRandom;

impl WeightedRandom {
    pub fn new() -> Self {
        Self
    }
}

impl<T> LoadBalancer<T> for WeightedRandom {
    fn next_client(&self, clients: &[Arc<Handle<T>>], cooldown: Duration) -> Option<Arc<Handle<T>>> {
        let available: Vec<&Arc<Handle<T>>> = clients
            .iter()
            .filter(|c| c.is_available_after(cooldown))
            .collect();

        let total: u64 = available.iter().map(|c| u64::from(c.weight())).sum();
        if total == 0 {
            return None;
        }

        let draw = rand::thread_rng().gen_range(0..total);
        let mut sum = 0u64;
        for client in available {
            sum += u64::from(client.weight());
            if draw < sum {
                return Some(client.clone());
            }
        }
        None
    }
}
