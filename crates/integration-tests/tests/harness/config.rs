//! Programmatic configuration builder for integration tests

use secrecy::SecretString;
use switchboard_config::{Config, ProviderKind, ProviderSpec, Specialty};

use super::server::TestGateway;

/// A mock provider spec with sane test defaults
pub fn mock_provider(cost_per_token: f64) -> ProviderSpec {
    ProviderSpec {
        kind: ProviderKind::Mock,
        model: "mock-model".to_owned(),
        cost_per_token,
        latency_ms: 5,
        rate_limit_rpm: 1000,
        specialties: Vec::new(),
        quality_score: 0.9,
        api_key: None,
        base_url: None,
    }
}

/// An OpenAI-kind provider pointed at a dead port, so every call fails
/// with a connection error
pub fn unreachable_provider(cost_per_token: f64) -> ProviderSpec {
    ProviderSpec {
        kind: ProviderKind::Openai,
        model: "dead-model".to_owned(),
        cost_per_token,
        latency_ms: 5,
        rate_limit_rpm: 1000,
        specialties: Vec::new(),
        quality_score: 0.9,
        api_key: Some(SecretString::from("test-key")),
        base_url: Some("http://127.0.0.1:9/v1".parse().expect("valid URL")),
    }
}

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Add a provider under the given name
    pub fn with_provider(mut self, name: &str, spec: ProviderSpec) -> Self {
        self.config.providers.insert(name.to_owned(), spec);
        self
    }

    /// Set a provider's specialty list
    pub fn with_specialties(mut self, name: &str, specialties: &[Specialty]) -> Self {
        if let Some(spec) = self.config.providers.get_mut(name) {
            spec.specialties = specialties.to_vec();
        }
        self
    }

    /// Cap a provider's request rate
    pub fn with_rate_limit(mut self, name: &str, rpm: u32) -> Self {
        if let Some(spec) = self.config.providers.get_mut(name) {
            spec.rate_limit_rpm = rpm;
        }
        self
    }

    /// Set the per-user budget cap
    pub fn with_budget_cap(mut self, cap: f64) -> Self {
        self.config.routing.user_budget_cap = cap;
        self
    }

    /// Set the default provider call timeout
    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.routing.default_timeout_ms = timeout_ms;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        let config = self.config;
        config.validate().expect("test config must be valid");
        config
    }

    /// Validate the config and serve it on an ephemeral port
    pub async fn spawn(self) -> TestGateway {
        TestGateway::spawn(self.build()).await
    }
}
