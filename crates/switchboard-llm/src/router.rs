//! Request orchestration: budget gate, candidate iteration, fallback
//!
//! Tries the ranked candidates in order until one succeeds. Every attempt
//! updates the breaker and the metrics; rate limits skip the breaker since
//! they signal quota pressure, not ill health. No state-store lock is held
//! across a provider call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use switchboard_config::{ClassifierConfig, Config, ProviderSpec};

use crate::error::{ProviderError, RouteError};
use crate::metrics::Outcome;
use crate::provider::ProviderClient;
use crate::select::{Selection, select_candidates};
use crate::store::StateStore;
use crate::types::{ChatRequest, ChatResponse};

/// Central request orchestrator
pub struct Router {
    providers: IndexMap<String, ProviderSpec>,
    clients: HashMap<String, Arc<dyn ProviderClient>>,
    keywords: ClassifierConfig,
    store: Arc<StateStore>,
    budget_cap: f64,
    default_timeout: Duration,
}

impl Router {
    pub fn new(
        config: &Config,
        store: Arc<StateStore>,
        clients: HashMap<String, Arc<dyn ProviderClient>>,
    ) -> Self {
        Self {
            providers: config.providers.clone(),
            clients,
            keywords: config.classifier.clone(),
            store,
            budget_cap: config.routing.user_budget_cap,
            default_timeout: Duration::from_millis(config.routing.default_timeout_ms),
        }
    }

    /// Route one chat request through the best available provider
    ///
    /// # Errors
    ///
    /// `Validation` for malformed requests, `BudgetExceeded` when the user
    /// is over cap, `NoProvidersAvailable` when selection is empty or every
    /// candidate failed.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, RouteError> {
        request.validate()?;
        let prefs = request.preferences.clone().unwrap_or_default();

        if let Some(user_id) = &request.user_id {
            let spend = self.store.user_spend(user_id);
            if spend > self.budget_cap {
                tracing::warn!(user_id = %user_id, spend, "budget exceeded");
                return Err(RouteError::BudgetExceeded);
            }
        }

        tracing::info!(
            prompt_len = request.prompt.len(),
            user_id = ?request.user_id,
            "handling request"
        );

        let Selection {
            candidates,
            probes,
            prompt_kind,
        } = select_candidates(&request.prompt, &prefs, &self.providers, &self.keywords, &self.store);

        if candidates.is_empty() {
            tracing::error!("no providers available");
            return Err(RouteError::NoProvidersAvailable);
        }

        tracing::debug!(
            kind = %prompt_kind,
            candidates = candidates.len(),
            "candidates ranked"
        );

        let timeout = prefs.timeout_ms.map_or(self.default_timeout, Duration::from_millis);

        let mut probes = ProbeGuard {
            store: self.store.as_ref(),
            held: probes,
        };

        for candidate in &candidates {
            let name = candidate.name.as_str();

            // Rate admission happens here, not at selection time, so a
            // refused slot shows up as a rate-limited attempt in metrics.
            if !self.store.rate.admit(name, candidate.spec.rate_limit_rpm) {
                tracing::warn!(provider = name, "rate window full, skipping");
                self.store.metrics.record(name, Outcome::RateLimited);
                if probes.resolve(name) {
                    self.store.breaker.record_rate_limited(name);
                }
                continue;
            }

            let Some(client) = self.clients.get(name) else {
                continue;
            };

            tracing::info!(provider = name, "calling provider");
            let attempt = match tokio::time::timeout(timeout, client.chat(&request.prompt, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Upstream(format!(
                    "timed out after {}ms",
                    timeout.as_millis()
                ))),
            };
            let held_probe = probes.resolve(name);

            match attempt {
                Ok(reply) => {
                    self.store.breaker.record_success(name);
                    self.store.metrics.record(
                        name,
                        Outcome::Success {
                            latency_ms: reply.latency_ms,
                            cost: reply.cost,
                        },
                    );
                    if let Some(user_id) = &request.user_id {
                        self.store.add_user_spend(user_id, reply.cost);
                    }

                    tracing::info!(
                        provider = name,
                        latency_ms = reply.latency_ms,
                        cost = reply.cost,
                        "provider success"
                    );
                    return Ok(ChatResponse {
                        provider_used: name.to_owned(),
                        content: reply.content,
                        latency_ms: reply.latency_ms,
                        cost: reply.cost,
                    });
                }
                Err(ProviderError::RateLimited(reason)) => {
                    tracing::warn!(provider = name, reason = %reason, "provider rate limited");
                    self.store.metrics.record(name, Outcome::RateLimited);
                    if held_probe {
                        self.store.breaker.record_rate_limited(name);
                    }
                }
                Err(ProviderError::Upstream(reason)) => {
                    tracing::error!(provider = name, reason = %reason, "provider failed");
                    self.store.breaker.record_failure(name);
                    self.store.metrics.record(name, Outcome::Failure);
                }
            }
        }

        tracing::error!("all providers exhausted");
        Err(RouteError::NoProvidersAvailable)
    }
}

/// Releases un-exercised probe slots when the request finishes or is
/// cancelled mid-flight, so a provider never wedges in probe-in-flight.
struct ProbeGuard<'a> {
    store: &'a StateStore,
    held: std::collections::HashSet<String>,
}

impl ProbeGuard<'_> {
    /// Stop tracking a probe whose outcome is being recorded
    fn resolve(&mut self, name: &str) -> bool {
        self.held.remove(name)
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        for name in &self.held {
            self.store.breaker.release_probe(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use switchboard_config::{ProviderKind, RoutingConfig};
    use switchboard_core::{Clock, ManualClock, SystemClock};

    use super::*;
    use crate::provider::ProviderReply;
    use crate::types::RequestPreferences;

    /// Client that replays a fixed sequence of outcomes
    struct ScriptedClient {
        name: String,
        script: Mutex<VecDeque<Result<ProviderReply, ProviderError>>>,
    }

    impl ScriptedClient {
        fn new(name: &str, script: Vec<Result<ProviderReply, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedClient {
        fn name(&self) -> &str {
            &self.name
        }

        async fn chat(&self, _prompt: &str, _timeout: Duration) -> Result<ProviderReply, ProviderError> {
            self.script
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or_else(|| Ok(reply(&self.name)))
        }
    }

    /// Client that never returns within any reasonable deadline
    struct StalledClient;

    #[async_trait]
    impl ProviderClient for StalledClient {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn chat(&self, _prompt: &str, _timeout: Duration) -> Result<ProviderReply, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(reply("stalled"))
        }
    }

    fn reply(name: &str) -> ProviderReply {
        ProviderReply {
            content: format!("reply from {name}"),
            latency_ms: 42,
            cost: 0.002,
        }
    }

    fn failure() -> Result<ProviderReply, ProviderError> {
        Err(ProviderError::Upstream("boom".to_owned()))
    }

    fn rate_limited() -> Result<ProviderReply, ProviderError> {
        Err(ProviderError::RateLimited("quota".to_owned()))
    }

    fn spec(cost_per_token: f64) -> ProviderSpec {
        ProviderSpec {
            kind: ProviderKind::Mock,
            model: "m".to_owned(),
            cost_per_token,
            latency_ms: 100,
            rate_limit_rpm: 100,
            specialties: Vec::new(),
            quality_score: 0.9,
            api_key: None,
            base_url: None,
        }
    }

    fn config_with(providers: &[(&str, f64)]) -> Config {
        let mut config = Config {
            routing: RoutingConfig::default(),
            ..Config::default()
        };
        for (name, cost) in providers {
            config.providers.insert((*name).to_owned(), spec(*cost));
        }
        config
    }

    fn router(
        config: &Config,
        clients: Vec<Arc<dyn ProviderClient>>,
    ) -> (Arc<StateStore>, Router) {
        let store = Arc::new(StateStore::new(Arc::new(SystemClock) as Arc<dyn Clock>));
        let clients = clients
            .into_iter()
            .map(|c| (c.name().to_owned(), c))
            .collect();
        let router = Router::new(config, Arc::clone(&store), clients);
        (store, router)
    }

    fn chat_request(user_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            prompt: "what is the meaning of life?".to_owned(),
            user_id: user_id.map(str::to_owned),
            preferences: None,
        }
    }

    #[tokio::test]
    async fn cheapest_provider_wins() {
        let config = config_with(&[("pricey", 0.00003), ("cheap", 0.00001)]);
        let (_, router) = router(
            &config,
            vec![ScriptedClient::new("pricey", vec![]), ScriptedClient::new("cheap", vec![])],
        );

        let response = router.handle(&chat_request(None)).await.unwrap();
        assert_eq!(response.provider_used, "cheap");
    }

    #[tokio::test]
    async fn falls_back_when_the_first_candidate_fails() {
        let config = config_with(&[("cheap", 0.00001), ("backup", 0.00002)]);
        let (store, router) = router(
            &config,
            vec![
                ScriptedClient::new("cheap", vec![failure()]),
                ScriptedClient::new("backup", vec![]),
            ],
        );

        let response = router.handle(&chat_request(None)).await.unwrap();
        assert_eq!(response.provider_used, "backup");

        let snapshot = store.metrics.snapshot();
        assert_eq!(snapshot["cheap"].failures, 1);
        assert_eq!(snapshot["backup"].success, 1);
        assert_eq!(store.breaker.consecutive_failures("cheap"), 1);
    }

    #[tokio::test]
    async fn upstream_rate_limit_skips_breaker_and_falls_back() {
        let config = config_with(&[("cheap", 0.00001), ("backup", 0.00002)]);
        let (store, router) = router(
            &config,
            vec![
                ScriptedClient::new("cheap", vec![rate_limited()]),
                ScriptedClient::new("backup", vec![]),
            ],
        );

        let response = router.handle(&chat_request(None)).await.unwrap();
        assert_eq!(response.provider_used, "backup");

        let snapshot = store.metrics.snapshot();
        assert_eq!(snapshot["cheap"].rate_limited, 1);
        assert_eq!(store.breaker.consecutive_failures("cheap"), 0);
        assert_eq!(store.breaker.status("cheap"), crate::CircuitStatus::Closed);
    }

    #[tokio::test]
    async fn full_local_window_skips_without_calling() {
        let config = config_with(&[("cheap", 0.00001), ("backup", 0.00002)]);
        let (store, router) = router(
            &config,
            vec![
                // A call to "cheap" would surface as a failure metric
                ScriptedClient::new("cheap", vec![failure()]),
                ScriptedClient::new("backup", vec![]),
            ],
        );

        // Exhaust cheap's window so admission refuses it at invocation time
        for _ in 0..100 {
            assert!(store.rate.admit("cheap", 100));
        }
        let response = router.handle(&chat_request(None)).await.unwrap();
        assert_eq!(response.provider_used, "backup");
        assert_eq!(store.breaker.status("cheap"), crate::CircuitStatus::Closed);

        let snapshot = store.metrics.snapshot();
        assert_eq!(snapshot["cheap"].rate_limited, 1);
        assert_eq!(snapshot["cheap"].failures, 0);
        assert_eq!(snapshot["backup"].success, 1);
    }

    #[tokio::test]
    async fn budget_gate_rejects_without_touching_state() {
        let config = config_with(&[("cheap", 0.00001)]);
        let (store, router) = router(&config, vec![ScriptedClient::new("cheap", vec![])]);

        store.add_user_spend("u", 1.05);
        let result = router.handle(&chat_request(Some("u"))).await;
        assert!(matches!(result, Err(RouteError::BudgetExceeded)));
        assert!(store.metrics.snapshot().is_empty());
        assert_eq!(store.rate.current("cheap"), 0);
    }

    #[tokio::test]
    async fn budget_gate_uses_strict_comparison() {
        let config = config_with(&[("cheap", 0.00001)]);
        let (store, router) = router(&config, vec![ScriptedClient::new("cheap", vec![])]);

        // Exactly at the cap is still allowed
        store.add_user_spend("u", 1.0);
        let response = router.handle(&chat_request(Some("u"))).await.unwrap();
        assert_eq!(response.provider_used, "cheap");

        // The charge pushed the user over; the next request is refused
        let result = router.handle(&chat_request(Some("u"))).await;
        assert!(matches!(result, Err(RouteError::BudgetExceeded)));
    }

    #[tokio::test]
    async fn successful_call_charges_the_user() {
        let config = config_with(&[("cheap", 0.00001)]);
        let (store, router) = router(&config, vec![ScriptedClient::new("cheap", vec![])]);

        let response = router.handle(&chat_request(Some("u"))).await.unwrap();
        assert!((store.user_spend("u") - response.cost).abs() < 1e-12);
    }

    #[tokio::test]
    async fn anonymous_requests_are_never_charged() {
        let config = config_with(&[("cheap", 0.00001)]);
        let (store, router) = router(&config, vec![ScriptedClient::new("cheap", vec![])]);

        router.handle(&chat_request(None)).await.unwrap();
        assert!(store.metrics.snapshot()["cheap"].success == 1);
        assert_eq!(store.user_spend(""), 0.0);
    }

    #[tokio::test]
    async fn every_candidate_failing_yields_unavailable() {
        let config = config_with(&[("a", 0.00001), ("b", 0.00002)]);
        let (store, router) = router(
            &config,
            vec![
                ScriptedClient::new("a", vec![failure()]),
                ScriptedClient::new("b", vec![failure()]),
            ],
        );

        let result = router.handle(&chat_request(None)).await;
        assert!(matches!(result, Err(RouteError::NoProvidersAvailable)));

        let snapshot = store.metrics.snapshot();
        assert_eq!(snapshot["a"].failures, 1);
        assert_eq!(snapshot["b"].failures, 1);
    }

    #[tokio::test]
    async fn manual_down_everywhere_yields_unavailable() {
        let config = config_with(&[("a", 0.00001)]);
        let (store, router) = router(&config, vec![ScriptedClient::new("a", vec![])]);

        store.set_manual_down("a", true);
        let result = router.handle(&chat_request(None)).await;
        assert!(matches!(result, Err(RouteError::NoProvidersAvailable)));
    }

    #[tokio::test]
    async fn timeout_counts_as_a_breaker_failure() {
        let config = config_with(&[("stalled", 0.00001), ("backup", 0.00002)]);
        let (store, router) = router(
            &config,
            vec![Arc::new(StalledClient), ScriptedClient::new("backup", vec![])],
        );

        let request = ChatRequest {
            prompt: "hello".to_owned(),
            user_id: None,
            preferences: Some(RequestPreferences {
                timeout_ms: Some(20),
                ..RequestPreferences::default()
            }),
        };
        let response = router.handle(&request).await.unwrap();
        assert_eq!(response.provider_used, "backup");
        assert_eq!(store.breaker.consecutive_failures("stalled"), 1);
        assert_eq!(store.metrics.snapshot()["stalled"].failures, 1);
    }

    #[tokio::test]
    async fn unexercised_probe_is_released_after_success() {
        let config = config_with(&[("cheap", 0.00001), ("flaky", 0.00002)]);
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(StateStore::new(Arc::clone(&clock) as Arc<dyn Clock>));

        let mut clients: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();
        for client in [ScriptedClient::new("cheap", vec![]), ScriptedClient::new("flaky", vec![])] {
            clients.insert(client.name().to_owned(), client);
        }
        let router = Router::new(&config, Arc::clone(&store), clients);

        for _ in 0..3 {
            store.breaker.record_failure("flaky");
        }
        clock.advance(crate::RESET_TIMEOUT + Duration::from_secs(1));

        // Selection captures flaky's probe, but cheap ranks first and
        // succeeds; the probe slot must come back
        let response = router.handle(&chat_request(None)).await.unwrap();
        assert_eq!(response.provider_used, "cheap");
        assert_eq!(store.breaker.try_admit("flaky"), crate::Admission::Probe);
    }

    #[tokio::test]
    async fn winning_probe_success_closes_the_circuit() {
        let config = config_with(&[("flaky", 0.00001), ("backup", 0.00002)]);
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(StateStore::new(Arc::clone(&clock) as Arc<dyn Clock>));

        let mut clients: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();
        for client in [ScriptedClient::new("flaky", vec![]), ScriptedClient::new("backup", vec![])] {
            clients.insert(client.name().to_owned(), client);
        }
        let router = Router::new(&config, Arc::clone(&store), clients);

        for _ in 0..3 {
            store.breaker.record_failure("flaky");
        }
        clock.advance(crate::RESET_TIMEOUT + Duration::from_secs(1));

        // Flaky is cheapest, wins the probe, and its script succeeds
        let response = router.handle(&chat_request(None)).await.unwrap();
        assert_eq!(response.provider_used, "flaky");
        assert_eq!(store.breaker.status("flaky"), crate::CircuitStatus::Closed);
        assert_eq!(store.breaker.consecutive_failures("flaky"), 0);
    }

    #[tokio::test]
    async fn breaker_trips_after_three_failed_requests() {
        let config = config_with(&[("flaky", 0.00001)]);
        let (store, router) = router(
            &config,
            vec![ScriptedClient::new("flaky", vec![failure(), failure(), failure()])],
        );

        for _ in 0..3 {
            let result = router.handle(&chat_request(None)).await;
            assert!(matches!(result, Err(RouteError::NoProvidersAvailable)));
        }
        assert_eq!(store.breaker.status("flaky"), crate::CircuitStatus::Open);

        // Fourth request finds no admissible provider and never reaches the
        // client (its script is exhausted and would succeed if called)
        let result = router.handle(&chat_request(None)).await;
        assert!(matches!(result, Err(RouteError::NoProvidersAvailable)));
        assert_eq!(store.metrics.snapshot()["flaky"].requests, 3);
    }
}
