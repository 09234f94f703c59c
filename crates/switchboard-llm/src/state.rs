//! Shared state for gateway route handlers

use std::sync::Arc;

use indexmap::IndexMap;
use switchboard_config::{Config, ProviderSpec};
use switchboard_core::{Clock, SystemClock};

use crate::breaker::CircuitStatus;
use crate::provider;
use crate::router::Router;
use crate::store::StateStore;

/// Handler state: the provider table, the state store, and the router
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayStateInner>,
}

struct GatewayStateInner {
    router: Router,
    store: Arc<StateStore>,
    providers: IndexMap<String, ProviderSpec>,
}

impl GatewayState {
    /// Build gateway state from configuration with the system clock
    ///
    /// # Errors
    ///
    /// Returns an error if any provider client fails to initialize.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build gateway state with an injected clock
    ///
    /// # Errors
    ///
    /// Returns an error if any provider client fails to initialize.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Arc::new(StateStore::new(clock));
        let clients = provider::build_registry(config)?;
        let router = Router::new(config, Arc::clone(&store), clients);

        Ok(Self {
            inner: Arc::new(GatewayStateInner {
                router,
                store,
                providers: config.providers.clone(),
            }),
        })
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    /// Static provider table in configuration order
    pub fn providers(&self) -> &IndexMap<String, ProviderSpec> {
        &self.inner.providers
    }

    /// Providers currently selectable: not manually down, breaker not open
    pub fn providers_available(&self) -> usize {
        self.inner
            .providers
            .keys()
            .filter(|name| {
                !self.inner.store.is_manual_down(name)
                    && self.inner.store.breaker.status(name) != CircuitStatus::Open
            })
            .count()
    }
}
