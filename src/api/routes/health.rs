//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (readings have been loaded)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Ready once at least one poll of the backend has succeeded.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.poller.status().await.last_success_at.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let poller = state.poller.status().await;
    let readings = state.store.len().await;

    let status = match (poller.last_success_at, poller.consecutive_failures) {
        (Some(_), 0) => "healthy",
        (Some(_), _) => "degraded",
        (None, _) => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        readings,
        poller,
        ws_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
