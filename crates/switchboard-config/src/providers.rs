use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Prompt categories a provider can declare as specialties
///
/// The classifier emits the same set, so a provider's `specialties` list is
/// matched directly against the classified prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Code,
    Writing,
    Analysis,
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code => write!(f, "code"),
            Self::Writing => write!(f, "writing"),
            Self::Analysis => write!(f, "analysis"),
        }
    }
}

/// Upstream protocol used to reach a provider
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Built-in mock backend (no network)
    #[default]
    Mock,
    /// OpenAI-compatible chat completions API
    Openai,
    /// Google Generative Language API
    Google,
}

/// Static specification for a single provider
///
/// Loaded once at startup and never mutated; all dynamic state (breaker,
/// rate window, metrics) lives in the state store.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSpec {
    /// Client protocol for this backend
    #[serde(rename = "type", default)]
    pub kind: ProviderKind,
    /// Model identifier sent to the backend
    pub model: String,
    /// Price per token in USD, used for cost ranking and budget filtering
    pub cost_per_token: f64,
    /// Nominal latency used for speed-priority ranking
    pub latency_ms: u64,
    /// Requests admitted per rolling 60-second window
    pub rate_limit_rpm: u32,
    /// Prompt categories this provider is preferred for
    #[serde(default)]
    pub specialties: Vec<Specialty>,
    /// Relative answer quality in [0, 1]
    pub quality_score: f64,
    /// API key for authenticated backends
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
}
