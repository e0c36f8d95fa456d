//! Benchmarks for window aggregation and health classification
//!
//! Run with: cargo bench

use aqms::health::{assess, Pollutant};
use aqms::readings::{summarize, Metric, Reading, ReadingSeries, Window, DEFAULT_CAPACITY};
use aqms::views::DashboardView;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const NOW: i64 = 1_700_000_000;

/// One reading per minute going back from `NOW`, newest first like the backend
fn create_test_readings(count: usize) -> Vec<Reading> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            Reading::at(NOW - i as i64 * 60)
                .with(Metric::Pm1, 5.0 + (x * 0.7) % 20.0)
                .with(Metric::Pm25, 8.0 + (x * 1.3) % 60.0)
                .with(Metric::Pm10, 15.0 + (x * 2.1) % 120.0)
                .with(Metric::Temp, 18.0 + (x * 0.1) % 10.0)
                .with(Metric::Hum, 35.0 + (x * 0.3) % 40.0)
                .with(Metric::Battery, 100.0 - (x * 0.01) % 50.0)
        })
        .collect()
}

fn bench_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("series");

    for size in [100, 1000, DEFAULT_CAPACITY] {
        let readings = create_test_readings(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("from_unordered_{}", size), |b| {
            b.iter(|| ReadingSeries::from_unordered(black_box(readings.clone()), DEFAULT_CAPACITY))
        });
    }

    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    let series = ReadingSeries::from_unordered(create_test_readings(DEFAULT_CAPACITY), DEFAULT_CAPACITY);

    for window in Window::presets() {
        group.bench_function(format!("window_{}", window), |b| {
            b.iter(|| summarize(black_box(series.as_slice()), *window, NOW))
        });
    }

    group.bench_function("dashboard_view_24h", |b| {
        b.iter(|| DashboardView::build(black_box(&series), Window::Day, NOW, Some(NOW)))
    });

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let concentrations: Vec<f64> = (0..1000).map(|i| i as f64 * 0.6).collect();

    for pollutant in Pollutant::all() {
        group.throughput(Throughput::Elements(concentrations.len() as u64));
        group.bench_function(format!("assess_{}", pollutant), |b| {
            b.iter(|| {
                concentrations
                    .iter()
                    .filter_map(|&c| assess(*pollutant, black_box(c)))
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_series, bench_summarize, bench_classify);
criterion_main!(benches);
