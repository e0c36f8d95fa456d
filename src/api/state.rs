//! Application State
//!
//! Shared state accessible by all handlers, wrapped in Arc for sharing
//! across async tasks.

use axum::http::{header, HeaderMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::backend::{BackendClient, BackendError, ReadingPoller, ReadingSource};
use crate::config::Config;
use crate::readings::ReadingStore;
use crate::session::{token_from_cookie_header, SessionToken};
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    /// Latest batch of readings from the backend
    pub store: Arc<ReadingStore>,
    pub poller: Arc<ReadingPoller>,
    pub hub: Arc<ConnectionHub>,
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BackendError> {
        Self::with_hub_config(config, HubConfig::default())
    }

    pub fn with_hub_config(config: Config, hub_config: HubConfig) -> Result<Self, BackendError> {
        let backend = Arc::new(BackendClient::new(&config.backend)?);
        let store = Arc::new(ReadingStore::new(config.dashboard.max_readings));
        let hub = Arc::new(ConnectionHub::new(hub_config));
        let source: Arc<dyn ReadingSource> = backend.clone();
        let poller = Arc::new(ReadingPoller::new(
            source,
            Arc::clone(&store),
            Some(Arc::clone(&hub)),
            Duration::from_secs(config.dashboard.poll_interval_secs.max(1)),
        ));

        Ok(Self {
            backend,
            store,
            poller,
            hub,
            config: Arc::new(config),
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }

    /// Session token from the request's cookies
    pub fn session_token(&self, headers: &HeaderMap) -> Option<SessionToken> {
        let name = &self.config.session.cookie_name;
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| token_from_cookie_header(value, name))
    }

    /// Map a backend error from an authenticated call; a rejected token ends the session
    pub fn admin_error(&self, error: BackendError) -> ApiError {
        if error.is_unauthorized() {
            ApiError::SessionExpired {
                cookie_name: self.config.session.cookie_name.clone(),
            }
        } else {
            ApiError::Backend(error)
        }
    }
}
