//! Health Classification
//!
//! Pure, deterministic mappings from measurements to status categories:
//!
//! - **bands**: particulate health bands and AQI sub-index
//! - **comfort**: temperature and humidity comfort
//! - **device**: station component online/offline status

pub mod bands;
pub mod comfort;
pub mod device;

pub use bands::{aqi, assess, classify, Classification, HealthBand, Pollutant};
pub use comfort::{humidity_comfort, temperature_comfort, Comfort};
pub use device::{device_status, Component, ComponentStatus};
