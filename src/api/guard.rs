//! Admin route guard
//!
//! Requests to `/admin` and `/admin/*` without a session cookie are sent to
//! the login page. Requests with one carry the token to handlers as an
//! `Extension<SessionToken>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::state::AppState;
use crate::session::is_admin_path;

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !is_admin_path(request.uri().path()) {
        return next.run(request).await;
    }

    match state.session_token(request.headers()) {
        Some(token) => {
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "No session, redirecting to login");
            Redirect::to("/login").into_response()
        }
    }
}
