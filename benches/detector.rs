//! Detector benchmark: isolation forest fit + score over a batch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use serde_json::{json, Value};
use std::sync::Arc;
use tracerx_ai::config::DetectorConfig;
use tracerx_ai::history::HistoryStore;
use tracerx_ai::model::{AnomalyDetector, IsolationForest};
use tracerx_ai::scan::validate;
use tracerx_ai::storage::NullStore;

fn make_rows(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                let f = i as f64;
                json!([format!("LAG{i:04}"), 4.0 + (f * 0.37) % 9.0, 3.0 + (f * 0.73) % 6.0, 1_700_000_000 + i])
            })
            .collect(),
    )
}

fn bench_forest_fit(c: &mut Criterion) {
    let data = Array2::from_shape_fn((256, 3), |(i, j)| ((i * 31 + j * 17) % 97) as f64);

    c.bench_function("forest_fit_256x3_100_trees", |b| {
        b.iter(|| IsolationForest::fit(black_box(data.view()), 100, 256, 42))
    });
}

fn bench_label_by_size(c: &mut Criterion) {
    let detector = AnomalyDetector::new(
        DetectorConfig::default(),
        Arc::new(HistoryStore::new()),
        Arc::new(NullStore),
    )
    .unwrap();

    let mut g = c.benchmark_group("label_by_rows");
    for n in [16, 128, 1024] {
        let raw = make_rows(n);
        let batch = validate(Some(&raw)).unwrap();
        g.bench_function(format!("rows_{}", n).as_str(), |b| {
            b.iter(|| detector.label(black_box(&batch)).unwrap())
        });
    }
    g.finish();
}

criterion_group!(benches, bench_forest_fit, bench_label_by_size);
criterion_main!(benches);
