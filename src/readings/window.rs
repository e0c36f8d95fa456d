//! Trailing time windows
//!
//! A window selects the readings whose timestamp falls within the last
//! `n` seconds of a reference "now".

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::OnceLock;
use thiserror::Error;

const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

/// A trailing time range used to filter readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    /// Last hour
    Hour,
    /// Last 24 hours
    Day,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// Arbitrary trailing length in seconds
    Custom(i64),
}

impl Window {
    /// Preset windows offered by the dashboard range controls
    pub fn presets() -> &'static [Window] {
        &[Window::Hour, Window::Day, Window::Week, Window::Month]
    }

    /// Window length in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Window::Hour => HOUR,
            Window::Day => DAY,
            Window::Week => 7 * DAY,
            Window::Month => 30 * DAY,
            Window::Custom(secs) => *secs,
        }
    }

    /// Earliest timestamp (inclusive) covered by this window
    pub fn cutoff(&self, now: i64) -> i64 {
        now.saturating_sub(self.seconds())
    }

    /// Whether a timestamp falls inside the window ending at `now`
    pub fn contains(&self, ts: i64, now: i64) -> bool {
        ts >= self.cutoff(now)
    }

    /// Canonical label
    pub fn label(&self) -> String {
        match self {
            Window::Hour => "1h".to_string(),
            Window::Day => "24h".to_string(),
            Window::Week => "7d".to_string(),
            Window::Month => "30d".to_string(),
            Window::Custom(secs) if secs % DAY == 0 => format!("{}d", secs / DAY),
            Window::Custom(secs) if secs % HOUR == 0 => format!("{}h", secs / HOUR),
            Window::Custom(secs) => format!("{}s", secs),
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Window::Day
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Failed to parse a window selector
#[derive(Debug, Error, PartialEq)]
pub enum WindowParseError {
    #[error("invalid window '{0}': use 1h, 24h, 7d, 30d, 1mo or <n>h/<n>d/<n>w")]
    Format(String),

    #[error("window must be longer than zero")]
    Empty,
}

fn window_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\s*(s|h|d|w|mo)$").expect("window pattern is a valid regex")
    })
}

impl std::str::FromStr for Window {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        let caps = window_pattern()
            .captures(&s)
            .ok_or_else(|| WindowParseError::Format(s.clone()))?;

        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| WindowParseError::Format(s.clone()))?;
        if amount == 0 {
            return Err(WindowParseError::Empty);
        }

        let unit = match &caps[2] {
            "s" => 1,
            "h" => HOUR,
            "d" => DAY,
            "w" => 7 * DAY,
            "mo" => 30 * DAY,
            _ => return Err(WindowParseError::Format(s.clone())),
        };
        let seconds = amount
            .checked_mul(unit)
            .ok_or_else(|| WindowParseError::Format(s.clone()))?;

        Ok(match seconds {
            HOUR => Window::Hour,
            DAY => Window::Day,
            s if s == 7 * DAY => Window::Week,
            s if s == 30 * DAY => Window::Month,
            s => Window::Custom(s),
        })
    }
}

impl Serialize for Window {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Window {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
