//! Secure storage benchmark: insert and read encrypted scan records.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::tempdir;
use tracerx_ai::scan::{ScanRecord, Timestamp};
use tracerx_ai::storage::SecureStore;

fn record(id: &str) -> ScanRecord {
    ScanRecord {
        batch_id: id.to_string(),
        latitude: 6.5244,
        longitude: 3.3792,
        timestamp: Timestamp::Text("bench".to_string()),
        is_anomaly: false,
        scanned_at: 0,
    }
}

fn bench_insert_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("scans.db"), b"bench-secret").unwrap();
    let rec = record("LAG-1");

    c.bench_function("storage_insert_record", |b| {
        b.iter(|| black_box(store.insert(&rec)).unwrap())
    });
}

fn bench_records_for(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SecureStore::open(&dir.path().join("scans.db"), b"bench-secret").unwrap();
    store.insert(&record("LAG-1")).unwrap();

    c.bench_function("storage_records_for", |b| {
        b.iter(|| black_box(store.records_for("LAG-1")).unwrap())
    });
}

criterion_group!(benches, bench_insert_record, bench_records_for);
criterion_main!(benches);
