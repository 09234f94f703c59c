//! Candidate selection for Switchboard
//!
//! Pure routing logic: prompt classification, cost estimation, and the
//! specialty-boosted ranking. State-dependent filtering (circuit breaker,
//! rate window, manual-down flags) happens in the caller; candidates
//! arriving here are already known to be available.

#![allow(clippy::must_use_candidate, clippy::cast_precision_loss)]

pub mod classify;
pub mod cost;
pub mod strategy;

pub use classify::classify;
pub use cost::{estimate_cost, estimate_tokens};
pub use strategy::{Candidate, Priority, rank};
