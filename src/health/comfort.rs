//! Indoor comfort status for temperature and humidity

use serde::Serialize;

/// Lower/upper comfort bounds, inclusive
pub const TEMP_COMFORT_C: (f64, f64) = (18.0, 26.0);
pub const HUMIDITY_COMFORT_PCT: (f64, f64) = (30.0, 60.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comfort {
    Cold,
    Dry,
    Comfortable,
    Humid,
    Hot,
}

impl Comfort {
    pub fn label(&self) -> &'static str {
        match self {
            Comfort::Cold => "Cold",
            Comfort::Dry => "Dry",
            Comfort::Comfortable => "Comfort",
            Comfort::Humid => "Humid",
            Comfort::Hot => "Hot",
        }
    }
}

impl std::fmt::Display for Comfort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn temperature_comfort(celsius: f64) -> Option<Comfort> {
    if !celsius.is_finite() {
        return None;
    }
    let (lo, hi) = TEMP_COMFORT_C;
    Some(if celsius < lo {
        Comfort::Cold
    } else if celsius > hi {
        Comfort::Hot
    } else {
        Comfort::Comfortable
    })
}

pub fn humidity_comfort(percent: f64) -> Option<Comfort> {
    if !percent.is_finite() {
        return None;
    }
    let (lo, hi) = HUMIDITY_COMFORT_PCT;
    Some(if percent < lo {
        Comfort::Dry
    } else if percent > hi {
        Comfort::Humid
    } else {
        Comfort::Comfortable
    })
}
