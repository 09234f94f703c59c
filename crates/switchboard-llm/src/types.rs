//! Wire types for the chat endpoint

use serde::{Deserialize, Serialize};
use switchboard_routing::Priority;

use crate::error::RouteError;

/// Preferences influencing candidate ranking and timeouts
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestPreferences {
    /// What to optimize when ranking providers
    #[serde(default)]
    pub priority: Priority,
    /// Skip providers whose estimated cost exceeds this (USD)
    #[serde(default)]
    pub max_cost_per_request: Option<f64>,
    /// Deadline for each provider call
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Incoming chat request
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub preferences: Option<RequestPreferences>,
}

impl ChatRequest {
    /// Check invariants serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `RouteError::Validation` for an empty prompt or
    /// non-positive preference values.
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.prompt.trim().is_empty() {
            return Err(RouteError::Validation("prompt must not be empty".to_owned()));
        }

        if let Some(prefs) = &self.preferences {
            if let Some(cap) = prefs.max_cost_per_request
                && cap <= 0.0
            {
                return Err(RouteError::Validation(
                    "max_cost_per_request must be positive".to_owned(),
                ));
            }
            if prefs.timeout_ms == Some(0) {
                return Err(RouteError::Validation("timeout_ms must be positive".to_owned()));
            }
        }

        Ok(())
    }
}

/// Successful routing result
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Name of the provider that produced the response
    pub provider_used: String,
    pub content: String,
    pub latency_ms: u64,
    pub cost: f64,
}
