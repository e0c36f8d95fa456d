//! Core data types for sensor readings
//!
//! - `Reading`: one timestamped snapshot from the monitoring station
//! - `Metric`: the numeric fields of a reading that can be aggregated

use serde::{Deserialize, Serialize};

/// One timestamped sensor/telemetry sample as served by the backend.
///
/// Every measurement is optional on the wire: a missing key or an explicit
/// `null` decodes to `None`. Readings are never mutated after decoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    /// Backend document ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unix timestamp in seconds
    pub ts: i64,

    /// PM1.0 concentration (µg/m³)
    #[serde(default)]
    pub pm1: Option<f64>,
    /// PM2.5 concentration (µg/m³)
    #[serde(default)]
    pub pm25: Option<f64>,
    /// PM10 concentration (µg/m³)
    #[serde(default)]
    pub pm10: Option<f64>,
    /// Temperature (°C)
    #[serde(default)]
    pub temp: Option<f64>,
    /// Relative humidity (%)
    #[serde(default)]
    pub hum: Option<f64>,
    /// Battery level (%)
    #[serde(default)]
    pub battery: Option<f64>,
    /// Input voltage (V)
    #[serde(default)]
    pub vin: Option<f64>,
    /// Output voltage (V)
    #[serde(default)]
    pub vout: Option<f64>,

    // Device-health flags
    #[serde(default)]
    pub aht20: Option<bool>,
    #[serde(default)]
    pub rtc: Option<bool>,
    #[serde(default)]
    pub pms7003: Option<bool>,
    #[serde(default)]
    pub wifi: Option<bool>,
    #[serde(default)]
    pub ntp: Option<bool>,
    #[serde(default)]
    pub sdcard: Option<bool>,
    #[serde(default)]
    pub thingspeak: Option<bool>,
}

impl Reading {
    /// Create an empty reading at the given timestamp
    pub fn at(ts: i64) -> Self {
        Self {
            ts,
            ..Default::default()
        }
    }

    /// Builder method: set a metric value
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        let slot = match metric {
            Metric::Pm1 => &mut self.pm1,
            Metric::Pm25 => &mut self.pm25,
            Metric::Pm10 => &mut self.pm10,
            Metric::Temp => &mut self.temp,
            Metric::Hum => &mut self.hum,
            Metric::Battery => &mut self.battery,
            Metric::Vin => &mut self.vin,
            Metric::Vout => &mut self.vout,
        };
        *slot = Some(value);
        self
    }

    /// Value of a metric, or `None` if missing or non-finite
    pub fn value(&self, metric: Metric) -> Option<f64> {
        let raw = match metric {
            Metric::Pm1 => self.pm1,
            Metric::Pm25 => self.pm25,
            Metric::Pm10 => self.pm10,
            Metric::Temp => self.temp,
            Metric::Hum => self.hum,
            Metric::Battery => self.battery,
            Metric::Vin => self.vin,
            Metric::Vout => self.vout,
        };
        raw.filter(|v| v.is_finite())
    }

    /// Timestamp as a UTC datetime
    pub fn datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.ts, 0)
    }
}

/// Numeric fields of a reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Pm1,
    Pm25,
    Pm10,
    Temp,
    Hum,
    Battery,
    Vin,
    Vout,
}

impl Metric {
    /// All metrics in display order
    pub fn all() -> &'static [Metric] {
        &[
            Metric::Pm1,
            Metric::Pm25,
            Metric::Pm10,
            Metric::Temp,
            Metric::Hum,
            Metric::Battery,
            Metric::Vin,
            Metric::Vout,
        ]
    }

    /// Field name used on the wire
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Pm1 => "pm1",
            Metric::Pm25 => "pm25",
            Metric::Pm10 => "pm10",
            Metric::Temp => "temp",
            Metric::Hum => "hum",
            Metric::Battery => "battery",
            Metric::Vin => "vin",
            Metric::Vout => "vout",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Pm1 => "PM1.0",
            Metric::Pm25 => "PM2.5",
            Metric::Pm10 => "PM10",
            Metric::Temp => "Temperature",
            Metric::Hum => "Humidity",
            Metric::Battery => "Battery Level",
            Metric::Vin => "Input Voltage",
            Metric::Vout => "Output Voltage",
        }
    }

    /// Unit of measurement
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Pm1 | Metric::Pm25 | Metric::Pm10 => "µg/m³",
            Metric::Temp => "°C",
            Metric::Hum | Metric::Battery => "%",
            Metric::Vin | Metric::Vout => "V",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['.', '_'], "");
        Metric::all()
            .iter()
            .copied()
            .find(|m| m.key() == normalized)
            .or(match normalized.as_str() {
                "temperature" => Some(Metric::Temp),
                "humidity" => Some(Metric::Hum),
                _ => None,
            })
            .ok_or_else(|| format!("unknown metric: {}", s))
    }
}
