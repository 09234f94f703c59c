//! The Switchboard routing engine
//!
//! Owns the shared state store (circuit breakers, rate windows, metrics,
//! manual-down flags, user spend), the provider clients, the fallback
//! router, and the HTTP handlers that expose them.

#![allow(clippy::must_use_candidate, clippy::cast_precision_loss)]

mod breaker;
mod error;
pub mod handler;
mod metrics;
pub mod provider;
mod ratelimit;
mod router;
mod select;
mod state;
mod store;
pub mod types;

pub use breaker::{Admission, CircuitBreaker, CircuitStatus, FAILURE_THRESHOLD, RESET_TIMEOUT};
pub use error::{ProviderError, RouteError};
pub use handler::gateway_router;
pub use metrics::{GlobalCounters, MetricsRegistry, Outcome, ProviderCounters, aggregate};
pub use ratelimit::RateLimiter;
pub use router::Router;
pub use state::GatewayState;
pub use store::StateStore;
pub use types::{ChatRequest, ChatResponse, RequestPreferences};
