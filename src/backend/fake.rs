//! In-process stand-in for the station backend, for tests

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::readings::{Metric, Reading};

pub const FAKE_USER: &str = "admin@aqms.local";
pub const FAKE_PASSWORD: &str = "secret1";
pub const FAKE_TOKEN: &str = "tok-123";

#[derive(Default)]
struct FakeState {
    readings: Vec<Reading>,
    password: Mutex<String>,
    export_requests: Mutex<Vec<Option<String>>>,
}

/// Running fake backend bound to an ephemeral loopback port
pub struct FakeBackend {
    pub url: String,
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let now = chrono::Utc::now().timestamp();
        // newest first, like the real backend
        let readings = (0..5)
            .map(|i| {
                Reading::at(now - i * 600)
                    .with(Metric::Pm25, 10.0 + i as f64)
                    .with(Metric::Battery, 90.0 - i as f64)
            })
            .collect();
        Self::with_readings(readings).await
    }

    pub async fn with_readings(readings: Vec<Reading>) -> Self {
        let state = Arc::new(FakeState {
            readings,
            password: Mutex::new(FAKE_PASSWORD.to_string()),
            export_requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/data", get(data))
            .route("/login", post(login))
            .route("/admin/dashboard", get(admin))
            .route("/change-password", post(change_password))
            .route("/admin/export-csv", get(export))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.state.readings
    }

    /// Raw `days` parameter of each export request received
    pub fn export_requests(&self) -> Vec<Option<String>> {
        self.state.export_requests.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", FAKE_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

async fn data(State(state): State<Arc<FakeState>>) -> Json<Vec<Reading>> {
    Json(state.readings.clone())
}

async fn login(
    State(state): State<Arc<FakeState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let password = state.password.lock().unwrap().clone();
    let ok = form.get("username").map(String::as_str) == Some(FAKE_USER)
        && form.get("password") == Some(&password);
    if ok {
        Json(json!({"access_token": FAKE_TOKEN, "token_type": "bearer"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect email or password"})),
        )
            .into_response()
    }
}

async fn admin(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"message": "Welcome to the admin dashboard", "admin": FAKE_USER})).into_response()
}

async fn change_password(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut password = state.password.lock().unwrap();
    if body.get("old_password") != Some(&*password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Old password is incorrect"})),
        )
            .into_response();
    }
    match body.get("new_password") {
        Some(new) => {
            *password = new.clone();
            Json(json!({"message": "Password updated successfully"})).into_response()
        }
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "new_password required"})),
        )
            .into_response(),
    }
}

async fn export(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let days = params.get("days").cloned();
    state.export_requests.lock().unwrap().push(days.clone());

    let mut body = String::from("ts,pm25\n");
    for reading in &state.readings {
        body.push_str(&format!("{},{}\n", reading.ts, reading.pm25.unwrap_or_default()));
    }
    ([("content-type", "text/csv")], body).into_response()
}
