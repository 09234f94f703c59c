//! Mock backend for demos and tests
//!
//! Sleeps for the provider's nominal latency, fails with the configured
//! probability, and otherwise echoes a canned response.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use switchboard_config::ProviderSpec;
use switchboard_routing::estimate_cost;

use super::{ProviderClient, ProviderReply};
use crate::error::ProviderError;

pub struct MockProvider {
    name: String,
    spec: ProviderSpec,
    failure_rate: f64,
}

impl MockProvider {
    pub fn new(name: String, spec: ProviderSpec, failure_rate: f64) -> Self {
        Self {
            name,
            spec,
            failure_rate,
        }
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, prompt: &str, _timeout: Duration) -> Result<ProviderReply, ProviderError> {
        let started = Instant::now();

        tokio::time::sleep(Duration::from_millis(self.spec.latency_ms)).await;

        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            return Err(ProviderError::Upstream(format!(
                "simulated failure from {}",
                self.name
            )));
        }

        let excerpt: String = prompt.chars().take(50).collect();
        Ok(ProviderReply {
            content: format!("Mock response from {}: {excerpt}...", self.name),
            latency_ms: started.elapsed().as_millis() as u64,
            cost: estimate_cost(&self.spec, prompt),
        })
    }
}
