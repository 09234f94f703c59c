//! Provider client trait and implementations

pub mod google;
pub mod mock;
pub mod openai;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use switchboard_config::{Config, ProviderKind};

use crate::error::ProviderError;

/// Reply from a single backend call
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub content: String,
    /// Wall-clock latency of the call
    pub latency_ms: u64,
    /// Cost reported (or estimated) by the client; this is what gets
    /// charged to the user
    pub cost: f64,
}

/// Trait implemented by each LLM backend client
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider name (config key)
    fn name(&self) -> &str;

    /// Send one chat prompt, bounded by `timeout`
    async fn chat(&self, prompt: &str, timeout: Duration) -> Result<ProviderReply, ProviderError>;
}

/// Build the name → client registry from configuration
///
/// With `[routing] mock = true` every provider gets a mock client
/// regardless of its declared type.
///
/// # Errors
///
/// Returns an error if a real client fails to initialize.
pub fn build_registry(config: &Config) -> anyhow::Result<HashMap<String, Arc<dyn ProviderClient>>> {
    let mut registry: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();

    for (name, spec) in &config.providers {
        let kind = if config.routing.mock { ProviderKind::Mock } else { spec.kind };
        let client: Arc<dyn ProviderClient> = match kind {
            ProviderKind::Mock => Arc::new(mock::MockProvider::new(
                name.clone(),
                spec.clone(),
                config.routing.mock_failure_rate,
            )),
            ProviderKind::Openai => Arc::new(openai::OpenAiProvider::new(name.clone(), spec.clone())?),
            ProviderKind::Google => Arc::new(google::GoogleProvider::new(name.clone(), spec.clone())?),
        };
        registry.insert(name.clone(), client);
    }

    Ok(registry)
}
