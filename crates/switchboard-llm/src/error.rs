use http::StatusCode;
use switchboard_core::HttpError;
use thiserror::Error;

/// Errors surfaced by the routing engine to the HTTP layer
#[derive(Debug, Error)]
pub enum RouteError {
    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    Validation(String),

    /// User exceeded their cumulative spend cap
    #[error("budget exceeded")]
    BudgetExceeded,

    /// Selection produced no candidates, or every candidate failed
    #[error("all providers unavailable")]
    NoProvidersAvailable,
}

impl HttpError for RouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BudgetExceeded => StatusCode::PAYMENT_REQUIRED,
            Self::NoProvidersAvailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::BudgetExceeded => "Budget exceeded".to_owned(),
            Self::NoProvidersAvailable => "All providers unavailable".to_owned(),
        }
    }
}

/// Failure reported by a provider client
///
/// Never surfaced to the caller; the fallback loop consumes both variants.
/// Rate limits are quota pressure, not health problems, so only `Upstream`
/// counts toward the circuit breaker.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream quota refusal, or the local window refused admission
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other backend failure, including timeouts
    #[error("provider failure: {0}")]
    Upstream(String),
}
