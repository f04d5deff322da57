//! FILENAME: pivot/benches/pivot_transforms.rs
//! Benchmarks for the pivot transform over synthetic sales-style data.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pivot::{transform_to_pivot, Aggregation, AggregationSpec, PivotConfig};
use record::Record;

fn synthetic_rows(count: usize) -> Vec<Record> {
    let regions = ["North", "South", "East", "West"];
    let statuses = ["open", "closed", "pending"];

    (0..count)
        .map(|i| {
            let mut record = Record::with_capacity(4);
            record.set("region", regions[i % regions.len()]);
            record.set("status", statuses[i % statuses.len()]);
            record.set("amt", (i % 100) as f64);
            record.set("qty", ((i * 7) % 13) as f64);
            record
        })
        .collect()
}

fn bench_pivot(c: &mut Criterion) {
    let data = synthetic_rows(10_000);

    let grouped = PivotConfig {
        rows: vec!["region".to_string()],
        values: vec![
            AggregationSpec::new("amt", Aggregation::Sum),
            AggregationSpec::new("qty", Aggregation::Average),
        ],
        ..PivotConfig::default()
    };

    let cross_tab = PivotConfig {
        columns: vec!["status".to_string()],
        show_grand_totals: true,
        show_row_totals: true,
        ..grouped.clone()
    };

    c.bench_function("pivot_grouped_10k", |b| {
        b.iter(|| transform_to_pivot(black_box(&data), black_box(&grouped)))
    });

    c.bench_function("pivot_cross_tab_10k", |b| {
        b.iter(|| transform_to_pivot(black_box(&data), black_box(&cross_tab)))
    });
}

criterion_group!(benches, bench_pivot);
criterion_main!(benches);
