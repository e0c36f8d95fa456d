//! Sensor Readings
//!
//! Client-side handling of the readings fetched from the backend:
//!
//! - **types**: `Reading` and `Metric`
//! - **window**: trailing time windows (1h, 24h, 7d, 30d, custom)
//! - **series**: bounded, chronologically sorted sequence
//! - **aggregate**: per-metric avg/min/max over a window
//! - **store**: shared, sequence-guarded holder of the latest batch
//!
//! # Example
//!
//! ```rust
//! use aqms::readings::{summarize, Metric, Reading, ReadingSeries, Window};
//!
//! let now = 1_700_000_000;
//! let series = ReadingSeries::from_unordered(
//!     vec![
//!         Reading::at(now - 60).with(Metric::Pm25, 12.0),
//!         Reading::at(now - 120).with(Metric::Pm25, 8.0),
//!     ],
//!     3000,
//! );
//!
//! let summary = summarize(series.as_slice(), Window::Day, now);
//! assert_eq!(summary.stats_for(Metric::Pm25).unwrap().avg, 10.0);
//! ```

pub mod aggregate;
pub mod series;
pub mod store;
pub mod types;
pub mod window;

pub use aggregate::{metric_stats, round_to, summarize, MetricStats, WindowSummary};
pub use series::{ReadingSeries, DEFAULT_CAPACITY};
pub use store::{ApplyOutcome, ReadingStore};
pub use types::{Metric, Reading};
pub use window::{Window, WindowParseError};
