//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::{handle::Handle, LoadBalancer};

/// Round-robin selector.
/// Stores a shared cursor; every scan step advances it, including steps that
/// land on a tripped client, so the next call continues where this one left off.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> LoadBalancer<T> for RoundRobin {
    fn next_client(&self, clients: &[Arc<Handle<T>>], cooldown: Duration) -> Option<Arc<Handle<T>>> {
        let len = clients.len();
        if len == 0 {
            return None;
        }

        // At most one full cycle
        for _ in 0..len {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
            let client = &clients[index];
            if client.is_available_after(cooldown) {
                return Some(client.clone());
            }
        }
        None
    }
}
