//! In-process gateway handle for black-box tests
//!
//! Serves the assembled router on an ephemeral port and exposes typed
//! drivers for each gateway endpoint, so tests read as routing scenarios
//! rather than HTTP plumbing.

use switchboard_config::Config;
use switchboard_server::Server;
use tokio_util::sync::CancellationToken;

/// A running gateway plus a client for its API
pub struct TestGateway {
    base_url: String,
    client: reqwest::Client,
    shutdown: CancellationToken,
}

impl TestGateway {
    /// Serve `config` on an ephemeral port; shuts down on drop
    pub async fn spawn(config: Config) -> Self {
        let router = Server::new(&config).expect("test config builds a server").into_router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral port available");
        let base_url = format!("http://{}", listener.local_addr().expect("listener bound"));

        let shutdown = CancellationToken::new();
        let serve_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
                .await
                .ok();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            shutdown,
        }
    }

    /// POST /chat/completions with an arbitrary body
    ///
    /// Returns the status code and the parsed JSON body, success or error.
    pub async fn chat(&self, body: serde_json::Value) -> (u16, serde_json::Value) {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("gateway reachable");

        let status = response.status().as_u16();
        (status, response.json().await.expect("JSON body"))
    }

    /// Route a bare prompt and return the provider that handled it
    ///
    /// Panics if the gateway does not answer 200.
    pub async fn route(&self, prompt: &str) -> String {
        let (status, body) = self.chat(serde_json::json!({ "prompt": prompt })).await;
        assert_eq!(status, 200, "chat was refused: {body}");
        body["provider_used"].as_str().expect("provider name").to_owned()
    }

    /// GET /routing/analytics
    pub async fn analytics(&self) -> serde_json::Value {
        self.get_json("/routing/analytics").await
    }

    /// GET /providers, returning the status object for one provider
    pub async fn provider_status(&self, name: &str) -> serde_json::Value {
        let listing = self.get_json("/providers").await;
        listing
            .as_array()
            .expect("provider array")
            .iter()
            .find(|p| p["name"] == name)
            .unwrap_or_else(|| panic!("provider {name} not listed"))
            .clone()
    }

    /// GET /providers, returning the number of listed providers
    pub async fn provider_count(&self) -> usize {
        self.get_json("/providers").await.as_array().expect("provider array").len()
    }

    /// GET /health
    pub async fn health(&self) -> serde_json::Value {
        self.get_json("/health").await
    }

    /// POST /simulate/failure, returning the status code
    pub async fn simulate_failure(&self, provider: &str, down: bool) -> u16 {
        self.client
            .post(format!("{}/simulate/failure", self.base_url))
            .json(&serde_json::json!({ "provider": provider, "down": down }))
            .send()
            .await
            .expect("gateway reachable")
            .status()
            .as_u16()
    }

    async fn get_json(&self, path: &str) -> serde_json::Value {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("gateway reachable")
            .json()
            .await
            .expect("JSON body")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
