//! Auth Routes
//!
//! - GET /login - Login form
//! - POST /login - Exchange credentials for a session cookie
//! - POST /logout - Clear the session cookie

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;

use crate::api::dto::LoginForm;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::backend::BackendError;
use crate::session::{clear_cookie, set_cookie};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn login_page(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, e))
        .unwrap_or_default();

    Html(format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>AQMS Admin Login</title></head>
<body>
<h1>Admin Login</h1>
{error}
<form method="post" action="/login">
  <label>Email <input name="username" type="email" required></label>
  <label>Password <input name="password" type="password" required></label>
  <button type="submit">Login</button>
</form>
</body>
</html>
"#
    ))
}

fn with_cookie(mut response: Response, cookie: &str) -> ApiResult<Response> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::Internal(format!("invalid cookie header: {}", e)))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// GET /login
pub async fn show_login() -> Html<String> {
    login_page(None)
}

/// POST /login
///
/// On success sets the token cookie and redirects to the dashboard.
/// Rejected credentials re-render the form.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, login_page(Some(INVALID_CREDENTIALS))).into_response());
    }

    match state.backend.login(username, &form.password).await {
        Ok(token) => {
            tracing::info!(user = %username, "Login succeeded");
            let session = &state.config.session;
            let cookie = set_cookie(&session.cookie_name, &token, session.http_only);
            with_cookie(Redirect::to("/dashboard").into_response(), &cookie)
        }
        Err(BackendError::Unauthorized(_)) | Err(BackendError::Api { status: 400..=499, .. }) => {
            tracing::info!(user = %username, "Login rejected");
            Ok((StatusCode::UNAUTHORIZED, login_page(Some(INVALID_CREDENTIALS))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /logout
pub async fn logout(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let cookie = clear_cookie(&state.config.session.cookie_name);
    with_cookie(Redirect::to("/login").into_response(), &cookie)
}
