//! API Error Types
//!
//! Defines error types for the gateway and their conversion to HTTP
//! responses with appropriate status codes.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;
use crate::export::ExportError;
use crate::session::clear_cookie;

pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the session token; carries the cookie to clear
    #[error("Session expired. Please login again.")]
    SessionExpired { cookie_name: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::SessionExpired { .. } => (StatusCode::SEE_OTHER, "SESSION_EXPIRED"),
            ApiError::Backend(e) => match e {
                BackendError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                BackendError::Unavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "BACKEND_UNAVAILABLE")
                }
                BackendError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT"),
                BackendError::Api { status, .. } => match StatusCode::from_u16(*status) {
                    Ok(s) if s.is_client_error() => (s, "BACKEND_REJECTED"),
                    _ => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
                },
                BackendError::Request(_) | BackendError::InvalidResponse(_) => {
                    (StatusCode::BAD_GATEWAY, "BACKEND_ERROR")
                }
            },
            ApiError::Export(ExportError::InvalidDays(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Backend(e) => e.detail(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::SessionExpired { cookie_name } = &self {
            tracing::info!("Backend rejected session, redirecting to login");
            let mut response = Redirect::to("/login").into_response();
            if let Ok(value) = HeaderValue::from_str(&clear_cookie(cookie_name)) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            return response;
        }

        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %message,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
