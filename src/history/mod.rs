//! Process-wide append-only log of labeled scans.
//!
//! Empty at process start and grows for the process lifetime; records are
//! never updated or removed. One detection run appends its whole batch under
//! a single write lock, so readers see either all of a batch or none of it.

use crate::scan::ScanRecord;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct HistoryStore {
    records: RwLock<Vec<ScanRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch atomically. Returns the new total.
    pub fn append_batch(&self, batch: &[ScanRecord]) -> usize {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.extend_from_slice(batch);
        records.len()
    }

    /// Copy of every record in arrival order.
    pub fn snapshot(&self) -> Vec<ScanRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fold over the records under one read lock without copying them.
    pub fn fold<T>(&self, init: T, f: impl FnMut(T, &ScanRecord) -> T) -> T {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .fold(init, f)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Timestamp;
    use std::sync::Arc;

    fn record(id: &str, is_anomaly: bool) -> ScanRecord {
        ScanRecord {
            batch_id: id.to_string(),
            latitude: 6.5,
            longitude: 3.4,
            timestamp: Timestamp::Text("t".into()),
            is_anomaly,
            scanned_at: 0,
        }
    }

    #[test]
    fn keeps_arrival_order_and_duplicates() {
        let store = HistoryStore::new();
        assert!(store.is_empty());
        store.append_batch(&[record("A", false), record("B", true)]);
        assert_eq!(store.append_batch(&[record("A", true)]), 3);
        let ids: Vec<_> = store.snapshot().into_iter().map(|r| r.batch_id).collect();
        assert_eq!(ids, vec!["A", "B", "A"]);
    }

    #[test]
    fn readers_never_see_partial_batches() {
        let store = Arc::new(HistoryStore::new());
        let batch: Vec<_> = (0..50).map(|i| record(&format!("B{i}"), i % 2 == 0)).collect();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    store.append_batch(&batch);
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(store.fold(0usize, |n, _| n + 1) % 50, 0);
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(store.len(), 50 * 200);
    }
}
