//! Dashboard and admin views
//!
//! Both the HTTP gateway and the CLI render these, so everything a page
//! shows is computed here from a reading series and a window.

use serde::Serialize;

use crate::backend::AdminInfo;
use crate::export::ExportDays;
use crate::health::{
    assess, device_status, humidity_comfort, temperature_comfort, Comfort, ComponentStatus,
    HealthBand, Pollutant,
};
use crate::readings::{summarize, Metric, MetricStats, Reading, ReadingSeries, Window, WindowSummary};

/// Decimal places shown for statistics
const DISPLAY_DECIMALS: i32 = 1;

/// Live value card for one metric of the latest reading
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LiveCard {
    pub metric: Metric,
    pub label: &'static str,
    pub unit: &'static str,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<HealthBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aqi: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfort: Option<Comfort>,
    /// Band or comfort label, `--` when there is no value
    pub status: String,
}

impl LiveCard {
    fn new(metric: Metric, latest: Option<&Reading>) -> Self {
        let value = latest.and_then(|r| r.value(metric));
        let assessment = Pollutant::from_metric(metric)
            .zip(value)
            .and_then(|(pollutant, v)| assess(pollutant, v));
        let comfort = value.and_then(|v| match metric {
            Metric::Temp => temperature_comfort(v),
            Metric::Hum => humidity_comfort(v),
            _ => None,
        });

        let status = match (assessment, comfort) {
            (Some(a), _) => a.band.label().to_string(),
            (None, Some(c)) => c.label().to_string(),
            _ => "--".to_string(),
        };

        Self {
            metric,
            label: metric.label(),
            unit: metric.unit(),
            value,
            band: assessment.map(|a| a.band),
            aqi: assessment.map(|a| a.aqi),
            comfort,
            status,
        }
    }
}

/// Window statistics for one metric, rounded for display
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsRow {
    pub metric: Metric,
    pub label: &'static str,
    pub unit: &'static str,
    /// Absent when the window has no values for this metric
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl StatsRow {
    fn new(metric: Metric, stats: Option<&MetricStats>) -> Self {
        let stats = stats.map(|s| s.rounded(DISPLAY_DECIMALS));
        Self {
            metric,
            label: metric.label(),
            unit: metric.unit(),
            avg: stats.map(|s| s.avg),
            min: stats.map(|s| s.min),
            max: stats.map(|s| s.max),
            count: stats.map(|s| s.count).unwrap_or(0),
        }
    }

    fn from_summary(summary: &WindowSummary<'_>, metric: Metric) -> Self {
        Self::new(metric, summary.stats_for(metric))
    }
}

/// Public dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub range: Window,
    pub now: i64,
    pub from_ts: i64,
    /// Unix seconds when the data was last refreshed from the backend
    pub last_updated: Option<i64>,
    pub latest: Option<Reading>,
    pub cards: Vec<LiveCard>,
    pub stats: Vec<StatsRow>,
    pub readings: Vec<Reading>,
}

pub const DASHBOARD_CARDS: [Metric; 5] = [Metric::Pm1, Metric::Pm25, Metric::Pm10, Metric::Temp, Metric::Hum];

impl DashboardView {
    pub fn build(series: &ReadingSeries, range: Window, now: i64, last_updated: Option<i64>) -> Self {
        let latest = series.latest();
        let summary = summarize(series.as_slice(), range, now);

        Self {
            range,
            now,
            from_ts: summary.from_ts,
            last_updated,
            latest: latest.cloned(),
            cards: DASHBOARD_CARDS.iter().map(|&m| LiveCard::new(m, latest)).collect(),
            stats: Metric::all()
                .iter()
                .map(|&m| StatsRow::from_summary(&summary, m))
                .collect(),
            readings: summary.readings.to_vec(),
        }
    }
}

/// Power health card on the admin page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PowerCard {
    pub latest: Option<f64>,
    pub points: usize,
    #[serde(flatten)]
    pub stats: StatsRow,
}

pub const POWER_METRICS: [Metric; 3] = [Metric::Battery, Metric::Vin, Metric::Vout];

/// Admin page
#[derive(Debug, Clone, Serialize)]
pub struct AdminView {
    pub message: String,
    pub admin: String,
    pub range: Window,
    pub now: i64,
    pub last_updated: Option<i64>,
    pub latest: Option<Reading>,
    /// Empty until a reading arrives
    pub device: Vec<ComponentStatus>,
    pub power: Vec<PowerCard>,
    pub export_presets: [u32; 4],
}

impl AdminView {
    pub fn build(
        info: AdminInfo,
        series: &ReadingSeries,
        range: Window,
        now: i64,
        last_updated: Option<i64>,
    ) -> Self {
        let latest = series.latest();
        let summary = summarize(series.as_slice(), range, now);

        let power = POWER_METRICS
            .iter()
            .map(|&metric| {
                let stats = StatsRow::from_summary(&summary, metric);
                PowerCard {
                    latest: latest.and_then(|r| r.value(metric)),
                    points: stats.count,
                    stats,
                }
            })
            .collect();

        Self {
            message: info.message,
            admin: info.admin,
            range,
            now,
            last_updated,
            latest: latest.cloned(),
            device: latest.map(device_status).unwrap_or_default(),
            power,
            export_presets: ExportDays::PRESETS,
        }
    }
}
