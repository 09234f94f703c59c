//! Shared mutable state behind the routing engine
//!
//! One `StateStore` is owned by the server and injected into every request
//! handler. Each concern keeps its own sharded map with one mutex per key
//! (provider name or user id); inserting a new key only contends on the
//! owning shard. No lock is ever held across a provider call.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use switchboard_core::Clock;

use crate::breaker::CircuitBreaker;
use crate::metrics::MetricsRegistry;
use crate::ratelimit::RateLimiter;

pub struct StateStore {
    /// Per-provider health state machine
    pub breaker: CircuitBreaker,
    /// Per-provider sliding admission window
    pub rate: RateLimiter,
    /// Per-provider attempt counters
    pub metrics: MetricsRegistry,
    manual_down: DashMap<String, bool>,
    user_spend: DashMap<String, Mutex<f64>>,
}

impl StateStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            breaker: CircuitBreaker::new(Arc::clone(&clock)),
            rate: RateLimiter::new(clock),
            metrics: MetricsRegistry::new(),
            manual_down: DashMap::new(),
            user_spend: DashMap::new(),
        }
    }

    /// Flip the operator-controlled downtime flag for a provider
    pub fn set_manual_down(&self, provider: &str, down: bool) {
        self.manual_down.insert(provider.to_owned(), down);
    }

    /// Whether an operator has flagged the provider down
    pub fn is_manual_down(&self, provider: &str) -> bool {
        self.manual_down.get(provider).is_some_and(|flag| *flag)
    }

    /// Cumulative spend for a user; 0 with no spending history
    pub fn user_spend(&self, user_id: &str) -> f64 {
        self.user_spend
            .get(user_id)
            .map_or(0.0, |entry| *entry.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Charge a completed request to a user
    pub fn add_user_spend(&self, user_id: &str, amount: f64) {
        let entry = self.user_spend.entry(user_id.to_owned()).or_default();
        let mut spend = entry.lock().unwrap_or_else(|e| e.into_inner());
        *spend += amount;
    }
}
