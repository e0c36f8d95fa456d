//! AQMS Dashboard Gateway
//!
//! HTTP layer between browsers and the station backend, built with Axum.
//!
//! # Endpoints
//!
//! ## Public
//! - `GET /api/data` - Readings held by the gateway, oldest first
//! - `GET /api/dashboard?range=24h` - Dashboard view (also `GET /dashboard`)
//! - `POST /api/refresh` - Poll the backend now
//!
//! ## Session
//! - `GET /login` - Login form
//! - `POST /login` - Sign in, sets the token cookie
//! - `POST /logout` - Clears the token cookie
//!
//! ## Admin (cookie required, otherwise redirected to `/login`)
//! - `GET /admin?range=30d` - Admin view
//! - `GET /admin/export-csv?days=7` - CSV export
//! - `POST /admin/change-password` - Change password
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Live readings
//!
//! # Example
//!
//! ```rust,ignore
//! use aqms::api::{serve, AppState};
//! use aqms::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let state = AppState::new(config)?;
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod guard;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::{websocket_handler, SystemEvent, WsEvent};

/// Build the gateway router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.dashboard.cors_origins);
    let shared_state = Arc::new(state);

    let api_routes = Router::new()
        .route("/data", get(routes::dashboard::get_data))
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/refresh", post(routes::dashboard::refresh));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let router = Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/login", get(routes::auth::show_login).post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/admin", get(routes::admin::admin_view))
        .route("/admin/export-csv", get(routes::admin::export_csv))
        .route("/admin/change-password", post(routes::admin::change_password))
        .route("/ws", get(websocket_handler))
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&shared_state),
            guard::require_session,
        ))
        .layer(TraceLayer::new_for_http());

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(shared_state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Cross-origin access for the configured origins; none means same origin only
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Start the poller and serve until shutdown
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.dashboard.addr();
    let hub = Arc::clone(&state.hub);
    let poll_task = Arc::clone(&state.poller).start();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("AQMS dashboard listening on {}", addr);

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    hub.broadcast(&WsEvent::system(SystemEvent::ShuttingDown, "Server shutting down"))
        .await;
    poll_task.abort();

    result.map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;
    tracing::info!("AQMS dashboard shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeBackend, FAKE_PASSWORD, FAKE_TOKEN, FAKE_USER};
    use crate::config::{BackendConfig, Config};
    use crate::readings::{Metric, Reading};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use tower::util::ServiceExt;

    fn config_for(url: &str) -> Config {
        Config {
            backend: BackendConfig::new(url),
            ..Default::default()
        }
    }

    async fn create_test_app() -> (Router, AppState, FakeBackend) {
        let fake = FakeBackend::start().await;
        let state = AppState::new(config_for(&fake.url)).unwrap();
        let router = build_router(state.clone());
        (router, state, fake)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("cookie", format!("token={}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_login_redirect(response: &Response) {
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app.oneshot(get("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_after_first_poll() {
        let (app, state, _fake) = create_test_app().await;

        let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.poller.refresh().await.unwrap();
        let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/health")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["readings"], 5);
    }

    #[tokio::test]
    async fn test_data_is_sorted_oldest_first() {
        let (app, state, _fake) = create_test_app().await;
        state.poller.refresh().await.unwrap();

        let response = app.oneshot(get("/api/data")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let ts: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["ts"].as_i64().unwrap())
            .collect();
        assert_eq!(ts.len(), 5);
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_dashboard_range() {
        let (app, state, _fake) = create_test_app().await;
        let now = chrono::Utc::now().timestamp();
        state
            .store
            .apply(
                1,
                vec![
                    Reading::at(now - 2 * 86_400).with(Metric::Pm25, 100.0),
                    Reading::at(now - 60).with(Metric::Pm25, 8.0),
                ],
            )
            .await;

        let response = app.clone().oneshot(get("/api/dashboard?range=1h")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["range"], "1h");
        assert_eq!(body["readings"].as_array().unwrap().len(), 1);
        assert_eq!(body["cards"][1]["band"], "good");

        let response = app.clone().oneshot(get("/dashboard?range=7d")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["readings"].as_array().unwrap().len(), 2);

        let response = app.oneshot(get("/api/dashboard?range=forever")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_dashboard_has_null_stats() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app.oneshot(get("/api/dashboard")).await.unwrap();
        let body = json_body(response).await;
        assert!(body["latest"].is_null());
        assert!(body["stats"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["avg"].is_null()));
    }

    #[tokio::test]
    async fn test_refresh_endpoint() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["seq"], 1);
        assert_eq!(body["applied"], true);
    }

    #[tokio::test]
    async fn test_admin_routes_redirect_without_session() {
        let (app, _state, _fake) = create_test_app().await;

        for uri in [
            "/admin",
            "/admin/",
            "/admin/export-csv?days=7",
            "/admin/unknown",
        ] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_login_redirect(&response);
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/change-password")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_login_redirect(&response);

        // An empty cookie is no session either
        let response = app.oneshot(get_with_token("/admin", "")).await.unwrap();
        assert_login_redirect(&response);
    }

    #[tokio::test]
    async fn test_public_routes_need_no_session() {
        let (app, _state, _fake) = create_test_app().await;
        for uri in ["/api/data", "/dashboard", "/login", "/health/live"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(format!(
                        "username={}&password={}",
                        urlencoding::encode(FAKE_USER),
                        FAKE_PASSWORD
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/dashboard");
        let cookie = response.headers()["set-cookie"].to_str().unwrap();
        assert!(cookie.starts_with(&format!("token={}; Path=/", FAKE_TOKEN)));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("username=someone&password=wrong"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("set-cookie").is_none());
        assert!(text_body(response).await.contains("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_login_redirect(&response);
        assert_eq!(response.headers()["set-cookie"], "token=; Max-Age=0; Path=/");
    }

    #[tokio::test]
    async fn test_admin_view_with_session() {
        let (app, state, _fake) = create_test_app().await;
        state.poller.refresh().await.unwrap();

        let response = app.oneshot(get_with_token("/admin", FAKE_TOKEN)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["admin"], FAKE_USER);
        assert_eq!(body["range"], "30d");
        assert_eq!(body["device"].as_array().unwrap().len(), 7);
        assert_eq!(body["power"][0]["metric"], "battery");
    }

    #[tokio::test]
    async fn test_expired_session_redirects_and_clears_cookie() {
        let (app, _state, _fake) = create_test_app().await;
        let response = app.oneshot(get_with_token("/admin", "stale")).await.unwrap();

        assert_login_redirect(&response);
        assert_eq!(response.headers()["set-cookie"], "token=; Max-Age=0; Path=/");
    }

    #[tokio::test]
    async fn test_export_forwards_selected_days() {
        let (app, _state, fake) = create_test_app().await;

        for days in ["1", "30", "90"] {
            let uri = format!("/admin/export-csv?days={}", days);
            let response = app
                .clone()
                .oneshot(get_with_token(&uri, FAKE_TOKEN))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let disposition = response.headers()["content-disposition"].to_str().unwrap();
            assert!(disposition.contains(&format!("aqms_data_{}days_", days)));
        }

        // No parameter still sends days to the backend
        let response = app
            .clone()
            .oneshot(get_with_token("/admin/export-csv", FAKE_TOKEN))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            fake.export_requests(),
            vec![
                Some("1".to_string()),
                Some("30".to_string()),
                Some("90".to_string()),
                Some("7".to_string()),
            ]
        );

        let response = app
            .oneshot(get_with_token("/admin/export-csv?days=0", FAKE_TOKEN))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fake.export_requests().len(), 4);
    }

    #[tokio::test]
    async fn test_change_password_validation_and_detail() {
        let (app, _state, _fake) = create_test_app().await;

        let post = |body: &str| {
            Request::builder()
                .method("POST")
                .uri("/admin/change-password")
                .header("cookie", format!("token={}", FAKE_TOKEN))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(post(
                r#"{"old_password":"x","new_password":"abc","confirm_password":"abc"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("at least 6"));

        let response = app
            .clone()
            .oneshot(post(
                r#"{"old_password":"wrong","new_password":"secret2","confirm_password":"secret2"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Old password is incorrect");

        let response = app
            .oneshot(post(&format!(
                r#"{{"old_password":"{}","new_password":"secret2","confirm_password":"secret2"}}"#,
                FAKE_PASSWORD
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_cors_layer_only_with_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["http://localhost:5173".to_string()]).is_some());
    }
}
