//! CSV Export
//!
//! Day-range selection for the backend's export endpoint, the download
//! file name, and local CSV rendering of fetched readings.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::health::Component;
use crate::readings::{Metric, Reading};

/// Number of days of history to export, always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExportDays(u32);

impl ExportDays {
    pub const PRESETS: [u32; 4] = [1, 7, 30, 90];

    pub fn new(days: u32) -> Result<Self, ExportError> {
        if days == 0 {
            Err(ExportError::InvalidDays(days.to_string()))
        } else {
            Ok(Self(days))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for ExportDays {
    fn default() -> Self {
        Self(7)
    }
}

impl fmt::Display for ExportDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportDays {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ExportError::InvalidDays(s.to_string()))?;
        Self::new(days)
    }
}

impl TryFrom<u32> for ExportDays {
    type Error = ExportError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<ExportDays> for u32 {
    fn from(days: ExportDays) -> Self {
        days.0
    }
}

/// `aqms_data_{days}days_{YYYY-MM-DD}.csv`
pub fn export_filename(days: ExportDays, date: NaiveDate) -> String {
    format!("aqms_data_{}days_{}.csv", days, date.format("%Y-%m-%d"))
}

/// Write readings as CSV: unix time, RFC 3339 time, metrics, device flags
pub fn write_readings_csv<W: Write>(writer: W, readings: &[Reading]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["ts".to_string(), "timestamp".to_string()];
    header.extend(Metric::all().iter().map(|m| m.key().to_string()));
    header.extend(Component::all().iter().map(|c| c.key().to_string()));
    csv.write_record(&header)?;

    for reading in readings {
        let mut record = vec![
            reading.ts.to_string(),
            reading
                .datetime()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
        ];
        record.extend(
            Metric::all()
                .iter()
                .map(|m| reading.value(*m).map(|v| v.to_string()).unwrap_or_default()),
        );
        record.extend(
            Component::all()
                .iter()
                .map(|c| c.flag(reading).map(|v| v.to_string()).unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("days must be a whole number of at least 1, got '{0}'")]
    InvalidDays(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_validation() {
        assert!(ExportDays::new(0).is_err());
        assert_eq!(ExportDays::new(1).unwrap().get(), 1);
        assert_eq!("30".parse::<ExportDays>().unwrap().get(), 30);
        assert!("0".parse::<ExportDays>().is_err());
        assert!("-3".parse::<ExportDays>().is_err());
        assert!("week".parse::<ExportDays>().is_err());
        assert_eq!(ExportDays::default().get(), 7);
    }

    #[test]
    fn test_presets_are_valid() {
        for days in ExportDays::PRESETS {
            assert!(ExportDays::new(days).is_ok());
        }
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<ExportDays>("0").is_err());
        assert_eq!(serde_json::from_str::<ExportDays>("90").unwrap().get(), 90);
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let days = ExportDays::new(30).unwrap();
        assert_eq!(export_filename(days, date), "aqms_data_30days_2024-03-09.csv");
    }

    #[test]
    fn test_write_csv() {
        let mut reading = Reading::at(1_700_000_000)
            .with(Metric::Pm25, 12.5)
            .with(Metric::Temp, 22.0);
        reading.wifi = Some(true);
        reading.sdcard = Some(false);

        let mut out = Vec::new();
        write_readings_csv(&mut out, &[reading, Reading::at(1_700_000_060)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ts,timestamp,pm1,pm25,pm10,temp,hum"));
        assert!(lines[0].ends_with("wifi,ntp,sdcard,thingspeak"));
        assert!(lines[1].starts_with("1700000000,2023-11-14T22:13:20+00:00,,12.5,,22,"));
        assert!(lines[1].ends_with(",true,,false,"));
        // absent values stay empty
        assert!(lines[2].starts_with("1700000060,"));
        assert!(lines[2].ends_with(",,,,,,,"));
    }
}
