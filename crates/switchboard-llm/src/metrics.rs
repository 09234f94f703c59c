//! Per-provider attempt counters and aggregation
//!
//! Every attempt bumps `requests` plus exactly one outcome counter, so
//! `requests = success + failures + rate_limited` holds at all times.
//! Latency sums only cover successes, keeping averages honest.

use std::collections::HashMap;
use std::sync::Mutex;

use dashmap::DashMap;

/// Outcome of one provider attempt
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Success { latency_ms: u64, cost: f64 },
    Failure,
    RateLimited,
}

/// Counter totals for one provider
#[derive(Debug, Default, Clone)]
pub struct ProviderCounters {
    pub requests: u64,
    pub success: u64,
    pub failures: u64,
    pub rate_limited: u64,
    /// Latency sum over successful attempts only
    pub latency_ms_sum: u64,
    pub cost_sum: f64,
}

impl ProviderCounters {
    /// Successes over total requests; 0 when no requests were made
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.success as f64 / self.requests as f64
        }
    }

    /// Mean latency over successes; 0 when none succeeded
    pub fn avg_latency_ms(&self) -> f64 {
        if self.success == 0 {
            0.0
        } else {
            self.latency_ms_sum as f64 / self.success as f64
        }
    }
}

/// Attempt counters keyed by provider name
#[derive(Default)]
pub struct MetricsRegistry {
    providers: DashMap<String, Mutex<ProviderCounters>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt outcome for a provider
    pub fn record(&self, provider: &str, outcome: Outcome) {
        let entry = self.providers.entry(provider.to_owned()).or_default();
        let mut counters = entry.lock().unwrap_or_else(|e| e.into_inner());

        counters.requests += 1;
        match outcome {
            Outcome::Success { latency_ms, cost } => {
                counters.success += 1;
                counters.latency_ms_sum += latency_ms;
                counters.cost_sum += cost;
            }
            Outcome::Failure => counters.failures += 1,
            Outcome::RateLimited => counters.rate_limited += 1,
        }
    }

    /// Copy out every provider's counters
    ///
    /// Only providers that have handled at least one attempt appear.
    pub fn snapshot(&self) -> HashMap<String, ProviderCounters> {
        self.providers
            .iter()
            .map(|entry| {
                let counters = entry.value().lock().unwrap_or_else(|e| e.into_inner());
                (entry.key().clone(), counters.clone())
            })
            .collect()
    }
}

/// Totals across all providers
#[derive(Debug, Default, Clone)]
pub struct GlobalCounters {
    pub requests: u64,
    pub success: u64,
    pub failures: u64,
    pub latency_ms_sum: u64,
    pub cost_sum: f64,
}

impl GlobalCounters {
    /// Total successes over total requests; 0 when idle
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.success as f64 / self.requests as f64
        }
    }

    /// Mean latency over all successful attempts; 0 when none succeeded
    pub fn avg_latency_ms(&self) -> f64 {
        if self.success == 0 {
            0.0
        } else {
            self.latency_ms_sum as f64 / self.success as f64
        }
    }
}

/// Fold per-provider counters into global totals
pub fn aggregate<'a>(snapshot: impl IntoIterator<Item = &'a ProviderCounters>) -> GlobalCounters {
    let mut global = GlobalCounters::default();
    for counters in snapshot {
        global.requests += counters.requests;
        global.success += counters.success;
        global.failures += counters.failures;
        global.latency_ms_sum += counters.latency_ms_sum;
        global.cost_sum += counters.cost_sum;
    }
    global
}
