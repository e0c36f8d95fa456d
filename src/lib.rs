//! # AQMS
//!
//! Air-quality monitoring dashboard gateway and command-line client for a
//! sensor station backend.
//!
//! ## Features
//!
//! - **Live readouts**: latest PM1/PM2.5/PM10, temperature and humidity with
//!   health bands and comfort status
//! - **Windowed trends**: per-metric avg/min/max over 1h, 24h, 7d, 30d or any
//!   custom trailing window
//! - **Admin area**: cookie session, device status, power health, password
//!   change and CSV export
//! - **Real-time**: WebSocket push of each newly polled reading
//!
//! ## Modules
//!
//! - [`readings`]: reading types, windows, series and aggregation
//! - [`health`]: health bands, AQI, comfort and device status
//! - [`backend`]: REST client and sequence-guarded poller
//! - [`session`]: session token, cookies and password change rules
//! - [`views`]: dashboard and admin page models
//! - [`api`]: HTTP gateway with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aqms::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = AppState::new(Config::load_default())?;
//!     aqms::serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod export;
pub mod health;
pub mod readings;
pub mod session;
pub mod views;
pub mod websocket;

// Re-export top-level types for convenience
pub use readings::{
    summarize, ApplyOutcome, Metric, MetricStats, Reading, ReadingSeries, ReadingStore, Window,
    WindowSummary,
};

pub use health::{assess, classify, Classification, Comfort, HealthBand, Pollutant};

pub use backend::{AdminInfo, BackendClient, BackendError, PollStatus, ReadingPoller, ReadingSource};

pub use session::{PasswordChange, PasswordError, SessionToken, TokenStore};

pub use export::{export_filename, write_readings_csv, ExportDays, ExportError};

pub use views::{AdminView, DashboardView};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use config::{Config, ConfigError, LoggingConfig};
