//! AQMS Dashboard Server
//!
//! Run with: cargo run --bin aqms-dashboard
//!
//! # Configuration
//!
//! Read from the first of `~/.config/aqms/config.toml`,
//! `/etc/aqms/config.toml` or `./config.toml`, then overridden by:
//! - `AQMS_BACKEND_URL`: Backend REST API (default: http://localhost:8000)
//! - `AQMS_HOST`: Host to bind to (default: 0.0.0.0)
//! - `AQMS_PORT`: Port to listen on (default: 3000)
//! - `AQMS_POLL_INTERVAL_SECS`: Backend poll interval (default: 6)
//! - `AQMS_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: Log filter (default: aqms=info,tower_http=info)

use aqms::api::{serve, AppState};
use aqms::config::{Config, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting AQMS dashboard v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = %config.backend.url,
        poll_interval_secs = config.dashboard.poll_interval_secs,
        "Backend configured"
    );

    let state = AppState::new(config)?;

    match state.backend.health_check().await {
        Ok(()) => tracing::info!("Backend connection verified"),
        Err(e) => tracing::warn!("Backend not available: {} (will keep polling)", e),
    }

    serve(state).await?;

    tracing::info!("AQMS dashboard stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter_directive().into());
    let json = logging.is_json();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
