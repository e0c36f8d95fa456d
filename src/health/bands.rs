//! Particulate health bands
//!
//! Breakpoints follow the US EPA AQI tables (PM2.5 as revised in 2024).
//! Concentrations are truncated before lookup: PM2.5 to 0.1 µg/m³, PM10 to
//! 1 µg/m³. There is no published PM1.0 table, so PM1.0 uses the PM2.5 rows.

use serde::{Deserialize, Serialize};

/// Ordinal health category, from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl HealthBand {
    pub fn all() -> &'static [HealthBand] {
        &[
            HealthBand::Good,
            HealthBand::Moderate,
            HealthBand::UnhealthyForSensitive,
            HealthBand::Unhealthy,
            HealthBand::VeryUnhealthy,
            HealthBand::Hazardous,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthBand::Good => "Good",
            HealthBand::Moderate => "Moderate",
            HealthBand::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            HealthBand::Unhealthy => "Unhealthy",
            HealthBand::VeryUnhealthy => "Very Unhealthy",
            HealthBand::Hazardous => "Hazardous",
        }
    }

    /// AQI index range `(low, high)` covered by this band
    pub fn index_range(&self) -> (u16, u16) {
        match self {
            HealthBand::Good => (0, 50),
            HealthBand::Moderate => (51, 100),
            HealthBand::UnhealthyForSensitive => (101, 150),
            HealthBand::Unhealthy => (151, 200),
            HealthBand::VeryUnhealthy => (201, 300),
            HealthBand::Hazardous => (301, 500),
        }
    }
}

impl std::fmt::Display for HealthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutants with a breakpoint table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm1,
    Pm25,
    Pm10,
}

impl Pollutant {
    pub fn all() -> &'static [Pollutant] {
        &[Pollutant::Pm1, Pollutant::Pm25, Pollutant::Pm10]
    }

    /// Matching reading metric
    pub fn metric(&self) -> crate::readings::Metric {
        use crate::readings::Metric;
        match self {
            Pollutant::Pm1 => Metric::Pm1,
            Pollutant::Pm25 => Metric::Pm25,
            Pollutant::Pm10 => Metric::Pm10,
        }
    }

    /// Pollutant for a reading metric, if it has one
    pub fn from_metric(metric: crate::readings::Metric) -> Option<Self> {
        use crate::readings::Metric;
        match metric {
            Metric::Pm1 => Some(Pollutant::Pm1),
            Metric::Pm25 => Some(Pollutant::Pm25),
            Metric::Pm10 => Some(Pollutant::Pm10),
            _ => None,
        }
    }

    fn table(&self) -> &'static BreakpointTable {
        match self {
            Pollutant::Pm1 | Pollutant::Pm25 => &PM25_TABLE,
            Pollutant::Pm10 => &PM10_TABLE,
        }
    }
}

impl std::fmt::Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.metric().fmt(f)
    }
}

impl std::str::FromStr for Pollutant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metric: crate::readings::Metric = s.parse()?;
        Pollutant::from_metric(metric).ok_or_else(|| format!("{} has no health bands", s))
    }
}

/// Breakpoints in integer steps of `1 / steps_per_unit` µg/m³
struct BreakpointTable {
    steps_per_unit: f64,
    /// Inclusive upper concentration (in steps) of each band, Good first
    upper: [i64; 6],
}

const PM25_TABLE: BreakpointTable = BreakpointTable {
    steps_per_unit: 10.0,
    upper: [90, 354, 554, 1254, 2254, 3254],
};

const PM10_TABLE: BreakpointTable = BreakpointTable {
    steps_per_unit: 1.0,
    upper: [54, 154, 254, 354, 424, 604],
};

impl BreakpointTable {
    /// Truncate a concentration to table steps
    fn steps(&self, concentration: f64) -> Option<i64> {
        if !concentration.is_finite() || concentration < 0.0 {
            return None;
        }
        // Small epsilon so 35.4 (stored as 35.39999..) stays 354 steps
        Some((concentration * self.steps_per_unit + 1e-9).floor() as i64)
    }

    fn row(&self, steps: i64) -> usize {
        self.upper
            .iter()
            .position(|&upper| steps <= upper)
            .unwrap_or(self.upper.len() - 1)
    }

    /// Lower bound (in steps) of a row
    fn lower(&self, row: usize) -> i64 {
        if row == 0 {
            0
        } else {
            self.upper[row - 1] + 1
        }
    }
}

/// Classify a concentration into a health band.
///
/// Returns `None` for negative or non-finite input. Concentrations above
/// the last breakpoint are `Hazardous`.
pub fn classify(pollutant: Pollutant, concentration: f64) -> Option<HealthBand> {
    let table = pollutant.table();
    let steps = table.steps(concentration)?;
    Some(HealthBand::all()[table.row(steps)])
}

/// AQI sub-index for a concentration, capped at 500
pub fn aqi(pollutant: Pollutant, concentration: f64) -> Option<u16> {
    let table = pollutant.table();
    let steps = table.steps(concentration)?;
    let row = table.row(steps);

    let c_lo = table.lower(row) as f64;
    let c_hi = table.upper[row] as f64;
    let (i_lo, i_hi) = HealthBand::all()[row].index_range();

    if steps as f64 >= c_hi {
        return Some(if row == table.upper.len() - 1 { 500 } else { i_hi });
    }

    let index = (i_hi - i_lo) as f64 / (c_hi - c_lo) * (steps as f64 - c_lo) + i_lo as f64;
    Some(index.round().min(500.0) as u16)
}

/// Band and AQI for one concentration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub pollutant: Pollutant,
    pub concentration: f64,
    pub band: HealthBand,
    pub aqi: u16,
}

/// Classify and index a concentration together
pub fn assess(pollutant: Pollutant, concentration: f64) -> Option<Classification> {
    Some(Classification {
        pollutant,
        concentration,
        band: classify(pollutant, concentration)?,
        aqi: aqi(pollutant, concentration)?,
    })
}
