//! Admin Routes
//!
//! All routes here sit behind the session guard and forward the caller's
//! token to the backend.
//!
//! - GET /admin?range= - Admin view
//! - GET /admin/export-csv?days= - CSV of the last `days` days
//! - POST /admin/change-password - Change the admin password

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{ExportParams, MessageResponse, RangeParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::export::export_filename;
use crate::session::{PasswordChange, SessionToken};
use crate::views::AdminView;

/// GET /admin
pub async fn admin_view(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<AdminView>> {
    let range = params.window_or(state.config.dashboard.admin_range)?;
    let info = state
        .backend
        .admin_dashboard(&token)
        .await
        .map_err(|e| state.admin_error(e))?;

    let series = state.store.snapshot().await;
    let last_updated = state.store.applied_at().await;

    Ok(Json(AdminView::build(
        info,
        &series,
        range,
        Utc::now().timestamp(),
        last_updated,
    )))
}

/// GET /admin/export-csv
///
/// The backend request always carries `days`; without a parameter the
/// default selection is used.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let days = params.days()?;
    let csv = state
        .backend
        .export_csv(&token, days)
        .await
        .map_err(|e| state.admin_error(e))?;

    let filename = export_filename(days, Utc::now().date_naive());
    tracing::info!(days = days.get(), bytes = csv.len(), file = %filename, "CSV exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// POST /admin/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Json(change): Json<PasswordChange>,
) -> ApiResult<Json<MessageResponse>> {
    change
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    state
        .backend
        .change_password(&token, &change)
        .await
        .map_err(|e| state.admin_error(e))?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
