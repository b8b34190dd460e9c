//! Uniform random selection strategy.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::{handle::Handle, LoadBalancer};

/// Random selector.
/// Draws a single index. A tripped pick fails the selection outright; unlike
/// [`RoundRobin`](super::round_robin::RoundRobin) there is no scan-forward.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl<T> LoadBalancer<T> for Random {
    fn next_client(&self, clients: &[Arc<Handle<T>>], cooldown: Duration) -> Option<Arc<Handle<T>>> {
        if clients.is_empty() {
            return None;
        }

        let index = rand::thread_rng().gen_range(0..clients.len());
        let client = &clients[index];
        client.is_available_after(cooldown).then(|| client.clone())
    }
}
