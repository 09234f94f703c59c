//! Per-provider sliding-window rate limiter
//!
//! Keeps the timestamps of admitted requests over the last 60 seconds per
//! provider. Admission is linearizable per provider: the window lock is
//! held only for the prune-and-append.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use switchboard_core::Clock;

/// Length of the rolling admission window
const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window request limiter keyed by provider name
pub struct RateLimiter {
    windows: DashMap<String, Mutex<VecDeque<Instant>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    fn with_window<T>(&self, provider: &str, f: impl FnOnce(&mut VecDeque<Instant>, Instant) -> T) -> T {
        let now = self.clock.now();
        let entry = self.windows.entry(provider.to_owned()).or_default();
        let mut window = entry.lock().unwrap_or_else(|e| e.into_inner());
        prune(&mut window, now);
        f(&mut window, now)
    }

    /// Try to consume one admission slot
    ///
    /// Returns false when the window already holds `limit` timestamps.
    pub fn admit(&self, provider: &str, limit: u32) -> bool {
        self.with_window(provider, |window, now| {
            if window.len() < limit as usize {
                window.push_back(now);
                true
            } else {
                false
            }
        })
    }

    /// Number of admissions currently inside the window
    pub fn current(&self, provider: &str) -> usize {
        self.with_window(provider, |window, _| window.len())
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&front) = window.front() {
        if now.duration_since(front) >= WINDOW {
            window.pop_front();
        } else {
            break;
        }
    }
}
