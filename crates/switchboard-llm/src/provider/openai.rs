//! OpenAI-compatible provider client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use switchboard_config::ProviderSpec;
use switchboard_routing::estimate_cost;
use url::Url;

use super::{ProviderClient, ProviderReply};
use crate::error::ProviderError;

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    name: String,
    spec: ProviderSpec,
    client: Client,
    base_url: Url,
}

impl OpenAiProvider {
    /// Create from a provider specification
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured.
    pub fn new(name: String, spec: ProviderSpec) -> anyhow::Result<Self> {
        if spec.api_key.is_none() {
            anyhow::bail!("provider '{name}': api_key is required for openai backends");
        }

        let base_url = spec
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Ok(Self {
            name,
            spec,
            client: Client::new(),
            base_url,
        })
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ProviderClient for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, prompt: &str, timeout: Duration) -> Result<ProviderReply, ProviderError> {
        let wire_request = WireRequest {
            model: &self.spec.model,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut builder = self
            .client
            .post(self.completions_url())
            .timeout(timeout)
            .json(&wire_request);

        if let Some(key) = &self.spec.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "upstream request failed");
            ProviderError::Upstream(e.to_string())
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(format!("upstream returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.name, status = %status, "upstream returned error");
            return Err(ProviderError::Upstream(format!("upstream returned {status}: {body}")));
        }

        let wire_response: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("failed to parse response: {e}")))?;

        let content = wire_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Upstream("response contained no choices".to_owned()))?;

        Ok(ProviderReply {
            content,
            latency_ms: started.elapsed().as_millis() as u64,
            cost: estimate_cost(&self.spec, prompt),
        })
    }
}

// -- Wire types --

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: String,
}
