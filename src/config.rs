//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::readings::{Window, DEFAULT_CAPACITY};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Dashboard gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Window used by the public dashboard when none is requested
    #[serde(default = "default_range")]
    pub default_range: Window,

    /// Window used by the admin health cards when none is requested
    #[serde(default = "default_admin_range")]
    pub admin_range: Window,

    #[serde(default = "default_max_readings")]
    pub max_readings: usize,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_poll_interval() -> u64 {
    6
}

fn default_range() -> Window {
    Window::Day
}

fn default_admin_range() -> Window {
    Window::Month
}

fn default_max_readings() -> usize {
    DEFAULT_CAPACITY
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            poll_interval_secs: default_poll_interval(),
            default_range: default_range(),
            admin_range: default_admin_range(),
            max_readings: default_max_readings(),
            cors_origins: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Session token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the token cookie HttpOnly (browser scripts then cannot read it)
    #[serde(default)]
    pub http_only: bool,

    /// Where the CLI keeps its token
    pub token_file: Option<PathBuf>,
}

fn default_cookie_name() -> String {
    "token".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            http_only: false,
            token_file: None,
        }
    }
}

impl SessionConfig {
    /// Token file path, falling back to the user config directory
    pub fn token_path(&self) -> PathBuf {
        self.token_file.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("aqms").join("token"))
                .unwrap_or_else(|| PathBuf::from(".aqms_token"))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("aqms={},tower_http={}", self.level, self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("aqms").join("config.toml")),
            Some(PathBuf::from("/etc/aqms/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment in production)
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Backend overrides
        if let Some(url) = lookup("AQMS_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(timeout) = lookup("AQMS_BACKEND_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.backend.request_timeout_ms = timeout;
        }

        // Dashboard overrides
        if let Some(host) = lookup("AQMS_HOST") {
            self.dashboard.host = host;
        }
        if let Some(port) = lookup("AQMS_PORT").and_then(|s| s.parse().ok()) {
            self.dashboard.port = port;
        }
        if let Some(secs) = lookup("AQMS_POLL_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
            self.dashboard.poll_interval_secs = secs;
        }
        if let Some(range) = lookup("AQMS_DEFAULT_RANGE").and_then(|s| s.parse().ok()) {
            self.dashboard.default_range = range;
        }

        // Session overrides
        if let Some(path) = lookup("AQMS_TOKEN_FILE") {
            self.session.token_file = Some(PathBuf::from(path));
        }

        // Logging overrides
        if let Some(level) = lookup("AQMS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("AQMS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# AQMS Dashboard Configuration
#
# Environment variables override these settings:
# - AQMS_BACKEND_URL
# - AQMS_BACKEND_TIMEOUT_MS
# - AQMS_HOST
# - AQMS_PORT
# - AQMS_POLL_INTERVAL_SECS
# - AQMS_DEFAULT_RANGE
# - AQMS_TOKEN_FILE
# - AQMS_LOG_LEVEL
# - AQMS_LOG_FORMAT

[backend]
# Backend REST API base URL
url = "http://localhost:8000"

# Request timeout in milliseconds
request_timeout_ms = 10000

[dashboard]
# Gateway host
host = "0.0.0.0"

# Gateway port
port = 3000

# How often to poll the backend for readings (seconds)
poll_interval_secs = 6

# Default window for the dashboard: 1h, 24h, 7d, 30d
default_range = "24h"

# Default window for the admin health cards
admin_range = "30d"

# Maximum readings held in memory
max_readings = 3000

# Allowed CORS origins (empty = same origin only)
cors_origins = []

[session]
# Name of the cookie holding the bearer token
cookie_name = "token"

# Set HttpOnly on the token cookie
http_only = false

# Where the CLI stores its token (default: <config dir>/aqms/token)
# token_file = "/home/me/.config/aqms/token"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
