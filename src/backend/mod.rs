//! Backend Integration
//!
//! The station backend owns storage and authentication. This module talks
//! to it over HTTP/JSON and keeps a local copy of its readings fresh.
//!
//! - **BackendClient**: REST client for readings, login and admin calls
//! - **ReadingPoller**: periodic and on-demand refresh into a `ReadingStore`

mod client;
mod poller;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

use crate::readings::Reading;

pub use client::{AdminInfo, BackendClient};
pub use poller::{PollOutcome, PollStatus, ReadingPoller};

/// Anything that can produce the current batch of readings
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch_readings(&self) -> Result<Vec<Reading>, BackendError>;
}

/// Errors that can occur when talking to the backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Backend error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized(_))
    }

    /// Message suitable for showing to a user
    pub fn detail(&self) -> String {
        match self {
            BackendError::Api { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }
}
