use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use switchboard_llm::GatewayState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    providers_available: usize,
    providers_total: usize,
}

/// Health check handler
///
/// Degraded when any provider is manually down or breaker-open.
pub async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    let total = state.providers().len();
    let available = state.providers_available();

    Json(HealthResponse {
        status: if available == total { "healthy" } else { "degraded" },
        providers_available: available,
        providers_total: total,
    })
}
