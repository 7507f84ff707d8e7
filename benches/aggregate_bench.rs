//! Benchmarks for Tally aggregation
//!
//! Run with: cargo bench

use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use tally::series::{bucket_range, merge_dense, Granularity, SeriesAggregator};
use tally::storage::{
    parse_timestamp, Bucket, BucketedSum, EventRecord, EventStore, SqliteEventStore, TimeRange,
};
use tempfile::tempdir;

fn year_range() -> TimeRange {
    TimeRange::parse("2022-01-01T00:00:00", "2022-12-31T23:00:00").unwrap()
}

/// One event every `every_hours` hours across 2022
fn create_test_events(every_hours: i64) -> Vec<EventRecord> {
    let start = parse_timestamp("2022-01-01T00:00:00").unwrap();
    (0..8760 / every_hours)
        .map(|i| EventRecord::new(start + Duration::hours(i * every_hours), i as f64))
        .collect()
}

fn bench_calendar(c: &mut Criterion) {
    let mut group = c.benchmark_group("calendar");
    let range = year_range();

    for &granularity in Granularity::all() {
        group.bench_function(format!("year_{}", granularity), |b| {
            b.iter(|| bucket_range(black_box(range.start), black_box(range.end), granularity).unwrap())
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let range = year_range();
    let calendar = bucket_range(range.start, range.end, Granularity::Hour).unwrap();

    for every_hours in [1, 24] {
        let rows: Vec<BucketedSum> = calendar
            .iter()
            .step_by(every_hours)
            .map(|bucket: &Bucket| BucketedSum::new(*bucket, 1.0))
            .collect();

        group.throughput(Throughput::Elements(calendar.len() as u64));
        group.bench_function(format!("hourly_year_{}_rows", rows.len()), |b| {
            b.iter(|| merge_dense(black_box(&calendar), black_box(&rows)))
        });
    }

    group.finish();
}

fn bench_sqlite_aggregate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempdir().unwrap();

    let store = rt.block_on(async {
        let store = SqliteEventStore::open(dir.path().join("bench.db")).unwrap();
        store.append(&create_test_events(1)).await.unwrap();
        Arc::new(store)
    });
    let aggregator = SeriesAggregator::new(store);
    let range = year_range();

    let mut group = c.benchmark_group("sqlite_aggregate");

    for &granularity in Granularity::all() {
        group.bench_function(format!("year_{}", granularity), |b| {
            b.iter(|| {
                rt.block_on(aggregator.aggregate(black_box(range), granularity))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_calendar, bench_merge, bench_sqlite_aggregate);
criterion_main!(benches);
