#![allow(clippy::must_use_candidate)]

pub mod classifier;
mod env;
mod loader;
pub mod providers;
pub mod routing;
pub mod server;

use indexmap::IndexMap;
use serde::Deserialize;

pub use classifier::ClassifierConfig;
pub use providers::{ProviderKind, ProviderSpec, Specialty};
pub use routing::RoutingConfig;
pub use server::{HealthConfig, ServerConfig};

/// Top-level Switchboard configuration
///
/// Provider tables keep their file order; ranking ties are broken by that
/// order, so it is part of the routing contract.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Provider specifications keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderSpec>,
    /// Prompt classifier keyword lists
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Routing behavior knobs
    #[serde(default)]
    pub routing: RoutingConfig,
}
