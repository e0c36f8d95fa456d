//! Windowed summary statistics
//!
//! Statistics are computed over exactly the readings a window selects.
//! Missing and non-finite values never enter a computation, and a metric with
//! nothing to aggregate has no statistics at all rather than zeros.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{Metric, Reading};
use super::window::Window;

/// Summary of one metric over a set of readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Number of finite values that contributed
    pub count: usize,
}

impl MetricStats {
    /// Compute statistics over finite values, `None` if there are none
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut avg = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            // Running mean stays finite where a running sum would overflow
            let n = count as f64;
            avg = avg - avg / n + value / n;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            avg,
            min,
            max,
            count,
        })
    }

    /// Copy rounded to `decimals` places for display
    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            avg: round_to(self.avg, decimals),
            min: round_to(self.min, decimals),
            max: round_to(self.max, decimals),
            count: self.count,
        }
    }
}

/// Round half away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Statistics for one metric over a slice of readings
pub fn metric_stats(readings: &[Reading], metric: Metric) -> Option<MetricStats> {
    MetricStats::from_values(readings.iter().filter_map(|r| r.value(metric)))
}

/// The readings of a window plus per-metric statistics over them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary<'a> {
    pub window: Window,
    pub now: i64,
    /// Earliest included timestamp
    pub from_ts: i64,
    #[serde(skip)]
    pub readings: &'a [Reading],
    /// Absent metrics had no finite values in the window
    pub stats: BTreeMap<Metric, MetricStats>,
}

impl<'a> WindowSummary<'a> {
    pub fn stats_for(&self, metric: Metric) -> Option<&MetricStats> {
        self.stats.get(&metric)
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Filter `readings` (ascending by `ts`) to `window` and summarize every metric
pub fn summarize(readings: &[Reading], window: Window, now: i64) -> WindowSummary<'_> {
    let from_ts = window.cutoff(now);
    let start = readings.partition_point(|r| r.ts < from_ts);
    let visible = &readings[start..];

    let stats = Metric::all()
        .iter()
        .filter_map(|&metric| metric_stats(visible, metric).map(|s| (metric, s)))
        .collect();

    tracing::trace!(
        window = %window,
        readings = visible.len(),
        "Summarized window"
    );

    WindowSummary {
        window,
        now,
        from_ts,
        readings: visible,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = MetricStats::from_values([2.0, 4.0, 9.0]).unwrap();
        assert_eq!(stats.avg, 5.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_huge_finite_values_keep_avg_finite() {
        let stats = MetricStats::from_values([f64::MAX, f64::MAX]).unwrap();
        assert!(stats.avg.is_finite());
        assert_eq!(stats.avg, f64::MAX);

        let mixed = MetricStats::from_values([f64::MAX, -f64::MAX]).unwrap();
        assert_eq!(mixed.avg, 0.0);
        assert_eq!(mixed.min, -f64::MAX);
    }

    #[test]
    fn test_stats_empty_is_absent() {
        assert!(MetricStats::from_values(std::iter::empty()).is_none());
        assert!(MetricStats::from_values([f64::NAN, f64::INFINITY]).is_none());
    }

    #[test]
    fn test_non_finite_excluded_not_zeroed() {
        let stats = MetricStats::from_values([10.0, f64::NAN, 20.0]).unwrap();
        assert_eq!(stats.avg, 15.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.count, 2);
    }

    #[test]
    fn test_missing_fields_excluded() {
        let readings = vec![
            Reading::at(1).with(Metric::Temp, 20.0),
            Reading::at(2),
            Reading::at(3).with(Metric::Temp, 22.0),
        ];
        let stats = metric_stats(&readings, Metric::Temp).unwrap();
        assert_eq!(stats.avg, 21.0);
        assert_eq!(stats.count, 2);
        assert!(metric_stats(&readings, Metric::Pm10).is_none());
    }

    #[test]
    fn test_summarize_uses_only_window() {
        let now = 10_000;
        let readings = vec![
            Reading::at(now - 7200).with(Metric::Pm25, 100.0),
            Reading::at(now - 3600).with(Metric::Pm25, 10.0),
            Reading::at(now - 60).with(Metric::Pm25, 20.0),
        ];
        let summary = summarize(&readings, Window::Hour, now);

        assert_eq!(summary.readings.len(), 2);
        assert_eq!(summary.from_ts, now - 3600);
        let pm25 = summary.stats_for(Metric::Pm25).unwrap();
        assert_eq!(pm25.avg, 15.0);
        assert_eq!(pm25.max, 20.0);
        assert!(summary.stats_for(Metric::Hum).is_none());
    }

    #[test]
    fn test_summarize_empty_window_has_no_stats() {
        let readings = vec![Reading::at(0).with(Metric::Pm25, 5.0)];
        let summary = summarize(&readings, Window::Hour, 1_000_000);
        assert!(summary.is_empty());
        assert!(summary.stats.is_empty());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stats"], serde_json::json!({}));
    }

    #[test]
    fn test_rounded() {
        let stats = MetricStats::from_values([1.04, 1.06, 2.0]).unwrap().rounded(1);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 2.0);
        assert_eq!(stats.avg, 1.4);
    }
}
