use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded = crate::env::expand_env(&raw)
            .map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, a provider carries an
    /// out-of-range numeric field, or the routing knobs are out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one provider must be configured");
        }

        for (name, spec) in &self.providers {
            if spec.model.is_empty() {
                anyhow::bail!("provider '{name}': model must not be empty");
            }
            if spec.cost_per_token <= 0.0 {
                anyhow::bail!("provider '{name}': cost_per_token must be positive");
            }
            if spec.latency_ms == 0 {
                anyhow::bail!("provider '{name}': latency_ms must be positive");
            }
            if spec.rate_limit_rpm == 0 {
                anyhow::bail!("provider '{name}': rate_limit_rpm must be positive");
            }
            if !(0.0..=1.0).contains(&spec.quality_score) {
                anyhow::bail!("provider '{name}': quality_score must be within [0, 1]");
            }
        }

        if self.routing.user_budget_cap <= 0.0 {
            anyhow::bail!("routing.user_budget_cap must be positive");
        }
        if self.routing.default_timeout_ms == 0 {
            anyhow::bail!("routing.default_timeout_ms must be positive");
        }
        if !(0.0..=1.0).contains(&self.routing.mock_failure_rate) {
            anyhow::bail!("routing.mock_failure_rate must be within [0, 1]");
        }

        Ok(())
    }
}
