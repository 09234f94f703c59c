//! Axum route handlers for the gateway API

use std::collections::HashMap;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use switchboard_config::Specialty;
use switchboard_core::HttpError;

use crate::breaker::CircuitStatus;
use crate::metrics::aggregate;
use crate::state::GatewayState;
use crate::types::ChatRequest;

/// Build the gateway router with all endpoints
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/chat/completions", routing::post(chat_completions))
        .route("/providers", routing::get(list_providers))
        .route("/routing/analytics", routing::get(routing_analytics))
        .route("/simulate/failure", routing::post(simulate_failure))
        .with_state(state)
}

/// Handle `POST /chat/completions`
async fn chat_completions(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    // Body-level deserialization problems (bad priority, wrong types) are
    // validation errors, same as the checks in ChatRequest::validate
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return detail_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match state.router().handle(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => detail_response(error.status_code(), error.detail()),
    }
}

/// Handle `GET /providers`
async fn list_providers(State(state): State<GatewayState>) -> Response {
    let snapshot = state.store().metrics.snapshot();

    let statuses: Vec<ProviderStatus> = state
        .providers()
        .iter()
        .map(|(name, spec)| {
            let success_rate = snapshot.get(name).map_or(0.0, |counters| counters.success_rate());
            ProviderStatus {
                name: name.clone(),
                model: spec.model.clone(),
                cost_per_token: spec.cost_per_token,
                latency_ms: spec.latency_ms,
                rate_limit_rpm: spec.rate_limit_rpm,
                specialties: spec.specialties.clone(),
                quality_score: spec.quality_score,
                is_down: state.store().is_manual_down(name),
                circuit_status: state.store().breaker.status(name),
                success_rate,
            }
        })
        .collect();

    Json(statuses).into_response()
}

/// Handle `GET /routing/analytics`
async fn routing_analytics(State(state): State<GatewayState>) -> Response {
    let snapshot = state.store().metrics.snapshot();
    let global = aggregate(snapshot.values());

    let providers: HashMap<String, ProviderReport> = snapshot
        .into_iter()
        .map(|(name, counters)| {
            let report = ProviderReport {
                requests: counters.requests,
                success: counters.success,
                failures: counters.failures,
                rate_limited: counters.rate_limited,
                success_rate: counters.success_rate(),
                avg_latency_ms: counters.avg_latency_ms(),
                is_down: state.store().is_manual_down(&name),
                circuit_status: state.store().breaker.status(&name),
            };
            (name, report)
        })
        .collect();

    Json(AnalyticsResponse {
        global: GlobalReport {
            total_requests: global.requests,
            total_success: global.success,
            total_failures: global.failures,
            avg_latency_ms: global.avg_latency_ms(),
            total_cost: global.cost_sum,
            success_rate: global.success_rate(),
        },
        providers,
    })
    .into_response()
}

/// Handle `POST /simulate/failure`
async fn simulate_failure(
    State(state): State<GatewayState>,
    Json(request): Json<FailureSimulationRequest>,
) -> Response {
    if !state.providers().contains_key(&request.provider) {
        return detail_response(
            StatusCode::NOT_FOUND,
            format!("Unknown provider: {}", request.provider),
        );
    }

    state.store().set_manual_down(&request.provider, request.down);
    tracing::info!(provider = %request.provider, down = request.down, "manual down flag set");

    Json(FailureSimulationResponse {
        message: format!("Provider {} set to down={}", request.provider, request.down),
    })
    .into_response()
}

/// Build a `{"detail": ...}` error body, the shape every error uses
fn detail_response(status: StatusCode, detail: String) -> Response {
    (status, Json(serde_json::json!({ "detail": detail }))).into_response()
}

// -- Wire types --

/// Static spec fields plus live status for `GET /providers`
#[derive(Debug, Serialize)]
struct ProviderStatus {
    name: String,
    model: String,
    cost_per_token: f64,
    latency_ms: u64,
    rate_limit_rpm: u32,
    specialties: Vec<Specialty>,
    quality_score: f64,
    is_down: bool,
    circuit_status: CircuitStatus,
    success_rate: f64,
}

#[derive(Debug, Serialize)]
struct AnalyticsResponse {
    global: GlobalReport,
    providers: HashMap<String, ProviderReport>,
}

#[derive(Debug, Serialize)]
struct GlobalReport {
    total_requests: u64,
    total_success: u64,
    total_failures: u64,
    avg_latency_ms: f64,
    total_cost: f64,
    success_rate: f64,
}

#[derive(Debug, Serialize)]
struct ProviderReport {
    requests: u64,
    success: u64,
    failures: u64,
    rate_limited: u64,
    success_rate: f64,
    avg_latency_ms: f64,
    is_down: bool,
    circuit_status: CircuitStatus,
}

#[derive(Debug, Deserialize)]
struct FailureSimulationRequest {
    provider: String,
    #[serde(default)]
    down: bool,
}

#[derive(Debug, Serialize)]
struct FailureSimulationResponse {
    message: String,
}
