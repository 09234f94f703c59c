use serde::Deserialize;

/// Routing behavior knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RoutingConfig {
    /// Cumulative per-user spend (USD) above which requests are refused
    pub user_budget_cap: f64,
    /// Timeout applied when a request carries no `timeout_ms` preference
    pub default_timeout_ms: u64,
    /// Use mock clients for every provider regardless of declared type
    pub mock: bool,
    /// Probability in [0, 1] that a mock call fails
    pub mock_failure_rate: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            user_budget_cap: 1.0,
            default_timeout_ms: 5000,
            mock: false,
            mock_failure_rate: 0.0,
        }
    }
}
