//! Data Transfer Objects
//!
//! Request parameters and small response bodies for the gateway endpoints.
//! Page-sized views live in `crate::views`.

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use crate::backend::PollStatus;
use crate::export::ExportDays;
use crate::readings::Window;

/// `?range=` on view endpoints
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub range: Option<String>,
}

impl RangeParams {
    /// Requested window, or `default` when none was given
    pub fn window_or(&self, default: Window) -> ApiResult<Window> {
        match self.range.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| ApiError::Validation(format!("range: {}", e))),
        }
    }
}

/// `?days=` on the export endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub days: Option<String>,
}

impl ExportParams {
    pub fn days(&self) -> ApiResult<ExportDays> {
        match self.days.as_deref() {
            None => Ok(ExportDays::default()),
            Some(raw) => Ok(raw.parse()?),
        }
    }
}

/// Login form fields, as posted by the login page
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of a manual refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub seq: u64,
    pub fetched: usize,
    /// False when a newer poll had already landed
    pub applied: bool,
    pub latest_ts: Option<i64>,
}

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" or "unhealthy"
    pub status: String,
    pub readings: usize,
    pub poller: PollStatus,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
