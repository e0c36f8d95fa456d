//! Backend REST API Client
//!
//! HTTP client for the station backend: public readings, login, and the
//! bearer-authenticated admin endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BackendError, ReadingSource};
use crate::config::BackendConfig;
use crate::export::ExportDays;
use crate::readings::Reading;
use crate::session::{PasswordChange, SessionToken};

/// Backend REST API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

/// Response of `GET /admin/dashboard`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdminInfo {
    #[serde(default)]
    pub message: String,
    /// Name of the signed-in administrator
    #[serde(default)]
    pub admin: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Export URL; `days` is always present
    pub fn export_url(&self, days: ExportDays) -> String {
        self.url(&format!("/admin/export-csv?days={}", days))
    }

    /// Check if the backend answers at all
    pub async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.url("/api/data"))
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status().is_server_error() {
            Err(BackendError::Unavailable)
        } else {
            Ok(())
        }
    }

    /// `GET /api/data`, in whatever order the backend returns
    pub async fn fetch_readings(&self) -> Result<Vec<Reading>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/data"))
            .send()
            .await
            .map_err(map_send_error)?;

        let readings: Vec<Reading> = check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        tracing::debug!(count = readings.len(), "Fetched readings");
        Ok(readings)
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, BackendError> {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(map_send_error)?;

        let body: LoginResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        SessionToken::new(body.access_token)
            .ok_or_else(|| BackendError::InvalidResponse("empty access token".to_string()))
    }

    pub async fn admin_dashboard(&self, token: &SessionToken) -> Result<AdminInfo, BackendError> {
        let response = self
            .client
            .get(self.url("/admin/dashboard"))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(map_send_error)?;

        check(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    /// Forward a validated password change
    pub async fn change_password(
        &self,
        token: &SessionToken,
        change: &PasswordChange,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url("/change-password"))
            .bearer_auth(token.as_str())
            .json(&change.body())
            .send()
            .await
            .map_err(map_send_error)?;

        check(response).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Raw CSV of the last `days` days
    pub async fn export_csv(&self, token: &SessionToken, days: ExportDays) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .get(self.export_url(days))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(map_send_error)?;

        let bytes = check(response).await?.bytes().await.map_err(map_send_error)?;
        tracing::debug!(days = days.get(), bytes = bytes.len(), "Exported CSV");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ReadingSource for BackendClient {
    async fn fetch_readings(&self) -> Result<Vec<Reading>, BackendError> {
        BackendClient::fetch_readings(self).await
    }
}

fn map_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Unavailable
    } else {
        BackendError::Request(e)
    }
}

/// Pass successful responses through, map the rest to errors
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = error_detail(&text);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BackendError::Unauthorized(detail));
    }

    Err(BackendError::Api {
        status: status.as_u16(),
        detail,
    })
}

/// Prefer the backend's `{"detail": ...}` message over the raw body
fn error_detail(text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => text.trim().to_string(),
    }
}
