//! Per-batch outlier labeling with side effects: history append, then durable writes.

use super::forest::IsolationForest;
use crate::config::DetectorConfig;
use crate::error::ModelError;
use crate::history::HistoryStore;
use crate::scan::{ScanRecord, ValidatedBatch};
use crate::storage::DurableStore;
use chrono::Utc;
use ndarray::ArrayView2;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MIN_ROWS: usize = 2;

/// Number of rows to flag: the count closest to `contamination * n`.
pub fn anomaly_count(n: usize, contamination: f64) -> usize {
    ((n as f64 * contamination).round() as usize).min(n)
}

/// Flag the `k` highest scores. Among equal scores the later row is flagged
/// first, so earlier rows stay normal when the cut falls inside a tie.
pub fn label_top(scores: &[f64], k: usize) -> Vec<bool> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(b.cmp(&a))
    });
    let mut labels = vec![false; scores.len()];
    for &i in order.iter().take(k) {
        labels[i] = true;
    }
    labels
}

fn has_variance(features: ArrayView2<f64>) -> bool {
    features.columns().into_iter().any(|col| {
        let first = col[0];
        col.iter().any(|&v| v != first)
    })
}

pub struct AnomalyDetector {
    config: DetectorConfig,
    history: Arc<HistoryStore>,
    store: Arc<dyn DurableStore>,
    store_failures: AtomicU64,
}

impl AnomalyDetector {
    pub fn new(
        config: DetectorConfig,
        history: Arc<HistoryStore>,
        store: Arc<dyn DurableStore>,
    ) -> Result<Self, ModelError> {
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(ModelError::InvalidContamination(config.contamination));
        }
        if config.n_trees == 0 {
            return Err(ModelError::NoTrees);
        }
        Ok(Self {
            config,
            history,
            store,
            store_failures: AtomicU64::new(0),
        })
    }

    /// Label each row anomalous or normal relative to this batch only. No side effects.
    pub fn label(&self, batch: &ValidatedBatch) -> Result<Vec<bool>, ModelError> {
        if batch.len() < MIN_ROWS {
            return Err(ModelError::TooFewRows {
                needed: MIN_ROWS,
                have: batch.len(),
            });
        }
        let features = batch.features.view();
        if !has_variance(features) {
            return Err(ModelError::ZeroVariance);
        }

        let forest = IsolationForest::fit(
            features,
            self.config.n_trees,
            self.config.max_samples,
            self.config.seed,
        );
        let scores = forest.score_rows(features);
        let k = anomaly_count(batch.len(), self.config.contamination);
        debug!(rows = batch.len(), k, "isolation forest scored batch");
        Ok(label_top(&scores, k))
    }

    /// Label the batch, record it in history, persist it, and return the
    /// anomalous batch ids in input order.
    pub fn detect(&self, batch: &ValidatedBatch) -> Result<Vec<String>, ModelError> {
        let labels = self.label(batch)?;
        let scanned_at = Utc::now().timestamp();
        let records: Vec<ScanRecord> = batch
            .rows
            .iter()
            .zip(&labels)
            .map(|(row, &is_anomaly)| ScanRecord::labeled(row, is_anomaly, scanned_at))
            .collect();

        let total = self.history.append_batch(&records);
        self.persist(&records);

        let anomalies: Vec<String> = records
            .iter()
            .filter(|r| r.is_anomaly)
            .map(|r| r.batch_id.clone())
            .collect();
        info!(
            rows = records.len(),
            anomalies = anomalies.len(),
            history_total = total,
            "batch labeled"
        );
        Ok(anomalies)
    }

    fn persist(&self, records: &[ScanRecord]) {
        let mut failed = 0u64;
        for record in records {
            if let Err(e) = self.store.append(record) {
                failed += 1;
                warn!(
                    store = self.store.name(),
                    batch_id = %record.batch_id,
                    error = %e,
                    "durable write failed"
                );
            }
        }
        if failed > 0 {
            self.store_failures.fetch_add(failed, AtomicOrdering::Relaxed);
        }
    }

    /// Durable writes that failed since startup.
    pub fn store_failures(&self) -> u64 {
        self.store_failures.load(AtomicOrdering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::validate;
    use crate::storage::NullStore;
    use serde_json::json;

    fn detector(contamination: f64) -> AnomalyDetector {
        let config = DetectorConfig {
            contamination,
            ..DetectorConfig::default()
        };
        AnomalyDetector::new(config, Arc::new(HistoryStore::new()), Arc::new(NullStore)).unwrap()
    }

    fn ten_rows() -> ValidatedBatch {
        let raw = json!([
            ["A1", 6.51, 3.41, "t"],
            ["A2", 6.62, 3.29, "t"],
            ["A3", 6.48, 3.37, "t"],
            ["A4", 6.57, 3.44, "t"],
            ["A5", 6.53, 3.31, "t"],
            ["A6", 6.60, 3.36, "t"],
            ["A7", 6.49, 3.39, "t"],
            ["A8", 6.55, 3.33, "t"],
            ["FAR1", 13.0, 5.2, "t"],
            ["FAR2", 9.1, 7.4, "t"],
        ]);
        validate(Some(&raw)).unwrap()
    }

    #[test]
    fn contamination_fixes_the_count() {
        let labels = detector(0.2).label(&ten_rows()).unwrap();
        assert_eq!(labels.iter().filter(|l| **l).count(), 2);
    }

    #[test]
    fn same_seed_same_labels() {
        let batch = ten_rows();
        assert_eq!(detector(0.2).label(&batch).unwrap(), detector(0.2).label(&batch).unwrap());
    }

    #[test]
    fn single_row_is_a_model_error() {
        let batch = validate(Some(&json!([["A", 6.5, 3.4, "t"]]))).unwrap();
        assert_eq!(
            detector(0.2).label(&batch).unwrap_err(),
            ModelError::TooFewRows { needed: 2, have: 1 }
        );
    }

    #[test]
    fn identical_rows_are_a_model_error() {
        let batch = validate(Some(&json!([["A", 6.5, 3.4, "t"], ["B", 6.5, 3.4, "u"]]))).unwrap();
        assert_eq!(detector(0.2).label(&batch).unwrap_err(), ModelError::ZeroVariance);
    }

    #[test]
    fn timestamps_near_f64_limits_are_labeled() {
        let raw = json!([["A", 6.5, 3.4, -1.0e308], ["B", 6.6, 3.3, 1.0e308], ["C", 6.7, 3.2, 0]]);
        let batch = validate(Some(&raw)).unwrap();
        assert!(batch.has_time_feature());
        let labels = detector(0.2).label(&batch).unwrap();
        assert_eq!(labels.iter().filter(|l| **l).count(), 1);
    }

    #[test]
    fn contamination_is_bounded() {
        let err = AnomalyDetector::new(
            DetectorConfig {
                contamination: 0.7,
                ..DetectorConfig::default()
            },
            Arc::new(HistoryStore::new()),
            Arc::new(NullStore),
        )
        .err();
        assert_eq!(err, Some(ModelError::InvalidContamination(0.7)));
    }

    #[test]
    fn ties_keep_earlier_rows_normal() {
        assert_eq!(label_top(&[0.5, 0.5, 0.5, 0.1], 1), vec![false, false, true, false]);
        assert_eq!(label_top(&[0.9, 0.5, 0.5], 2), vec![true, false, true]);
    }

    #[test]
    fn count_rounds_to_nearest() {
        assert_eq!(anomaly_count(10, 0.2), 2);
        assert_eq!(anomaly_count(5, 0.2), 1);
        assert_eq!(anomaly_count(2, 0.2), 0);
        assert_eq!(anomaly_count(7, 0.5), 4);
    }

    #[test]
    fn detect_appends_every_row() {
        let history = Arc::new(HistoryStore::new());
        let d = AnomalyDetector::new(DetectorConfig::default(), Arc::clone(&history), Arc::new(NullStore))
            .unwrap();
        let anomalies = d.detect(&ten_rows()).unwrap();
        assert_eq!(anomalies.len(), 2);
        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot.iter().filter(|r| r.is_anomaly).count(), 2);
        assert_eq!(d.store_failures(), 0);
    }
}
