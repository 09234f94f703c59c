//! Per-provider circuit breaker
//!
//! Tracks consecutive failures per provider and blocks selection of
//! providers that keep failing, allowing a single probe request through
//! once the reset timeout elapses.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use switchboard_core::Clock;

/// Consecutive failures before a provider's circuit opens
pub const FAILURE_THRESHOLD: u32 = 3;

/// How long a circuit stays open before a probe is allowed
pub const RESET_TIMEOUT: Duration = Duration::from_secs(60);

/// Circuit state reported for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitStatus {
    /// Normal operation, requests flow through
    Closed,
    /// Provider is failing, requests are blocked
    Open,
    /// Reset timeout elapsed; a probe may test recovery
    HalfOpen,
}

/// Result of an admission check at selection time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed, request may proceed
    Closed,
    /// This caller won the half-open probe slot
    Probe,
    /// Circuit open, or the probe slot is already taken
    Refused,
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_in_flight: bool,
}

/// Per-provider circuit breaker keyed by provider name
pub struct CircuitBreaker {
    states: DashMap<String, Mutex<BreakerState>>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            states: DashMap::new(),
            clock,
        }
    }

    fn with_state<T>(&self, provider: &str, f: impl FnOnce(&mut BreakerState) -> T) -> T {
        let entry = self.states.entry(provider.to_owned()).or_default();
        let mut state = entry.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Check whether selection may route to this provider right now
    ///
    /// An open circuit whose reset timeout has elapsed admits exactly one
    /// caller as the half-open probe; every other caller keeps seeing the
    /// circuit as open until that probe resolves. A caller that receives
    /// `Admission::Probe` but never invokes the provider must call
    /// `release_probe` so the slot frees up.
    pub fn try_admit(&self, provider: &str) -> Admission {
        let now = self.clock.now();
        self.with_state(provider, |state| {
            if state.consecutive_failures < FAILURE_THRESHOLD {
                return Admission::Closed;
            }
            match state.opened_at {
                Some(opened) if now.duration_since(opened) < RESET_TIMEOUT => Admission::Refused,
                Some(_) if state.half_open_in_flight => Admission::Refused,
                Some(_) => {
                    state.half_open_in_flight = true;
                    Admission::Probe
                }
                // Failures at threshold always set opened_at; treat the
                // unreachable combination as closed rather than wedging.
                None => Admission::Closed,
            }
        })
    }

    /// Current status without consuming a probe slot
    pub fn status(&self, provider: &str) -> CircuitStatus {
        let now = self.clock.now();
        self.with_state(provider, |state| {
            if state.consecutive_failures < FAILURE_THRESHOLD {
                return CircuitStatus::Closed;
            }
            match state.opened_at {
                Some(opened) if now.duration_since(opened) < RESET_TIMEOUT => CircuitStatus::Open,
                Some(_) => CircuitStatus::HalfOpen,
                None => CircuitStatus::Closed,
            }
        })
    }

    /// Record a successful call, closing the circuit
    pub fn record_success(&self, provider: &str) {
        self.with_state(provider, |state| {
            state.consecutive_failures = 0;
            state.opened_at = None;
            state.half_open_in_flight = false;
        });
    }

    /// Record a failed call, opening the circuit at the threshold
    pub fn record_failure(&self, provider: &str) {
        let now = self.clock.now();
        let tripped = self.with_state(provider, |state| {
            state.consecutive_failures += 1;
            state.half_open_in_flight = false;
            if state.consecutive_failures >= FAILURE_THRESHOLD {
                let newly_opened = state.opened_at.is_none();
                state.opened_at = Some(now);
                newly_opened
            } else {
                false
            }
        });
        if tripped {
            tracing::warn!(provider, "circuit breaker opened");
        }
    }

    /// Record that a half-open probe got rate-limited
    ///
    /// Re-opens the circuit with a fresh timer without counting toward the
    /// failure threshold. Only meaningful for the caller holding the probe.
    pub fn record_rate_limited(&self, provider: &str) {
        let now = self.clock.now();
        self.with_state(provider, |state| {
            if state.half_open_in_flight {
                state.opened_at = Some(now);
                state.half_open_in_flight = false;
            }
        });
    }

    /// Release a probe slot that was admitted but never exercised
    ///
    /// Leaves `opened_at` untouched, so the next admission check may
    /// re-probe immediately.
    pub fn release_probe(&self, provider: &str) {
        self.with_state(provider, |state| {
            state.half_open_in_flight = false;
        });
    }

    /// Consecutive failure count, for diagnostics
    pub fn consecutive_failures(&self, provider: &str) -> u32 {
        self.with_state(provider, |state| state.consecutive_failures)
    }
}
