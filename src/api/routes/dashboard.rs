//! Dashboard Routes
//!
//! - GET /api/data - Stored readings, oldest first
//! - GET /api/dashboard?range= - Dashboard view (also served at /dashboard)
//! - POST /api/refresh - Poll the backend now

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{RangeParams, RefreshResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::readings::{ApplyOutcome, Reading};
use crate::views::DashboardView;

/// GET /api/data
pub async fn get_data(State(state): State<Arc<AppState>>) -> Json<Vec<Reading>> {
    Json(state.store.snapshot().await.as_slice().to_vec())
}

/// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<DashboardView>> {
    let range = params.window_or(state.config.dashboard.default_range)?;
    let series = state.store.snapshot().await;
    let last_updated = state.store.applied_at().await;

    Ok(Json(DashboardView::build(
        &series,
        range,
        Utc::now().timestamp(),
        last_updated,
    )))
}

/// POST /api/refresh
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.poller.refresh().await?;
    let latest_ts = state.store.latest().await.map(|r| r.ts);

    tracing::info!(seq = outcome.seq, fetched = outcome.fetched, "Manual refresh");

    Ok(Json(RefreshResponse {
        seq: outcome.seq,
        fetched: outcome.fetched,
        applied: matches!(outcome.apply, ApplyOutcome::Applied { .. }),
        latest_ts,
    }))
}
