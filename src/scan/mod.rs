//! Scan rows as submitted by clients, and the labeled records derived from them.

mod validate;

pub use validate::{validate, ValidatedBatch};

use serde::{Deserialize, Serialize};

/// Scan time as the client sent it. Never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(serde_json::Number),
    Text(String),
}

impl Timestamp {
    /// Numeric value usable as a model feature. Text timestamps are opaque.
    pub fn as_feature(&self) -> Option<f64> {
        match self {
            Timestamp::Epoch(n) => n.as_f64().filter(|v| v.is_finite()),
            Timestamp::Text(_) => None,
        }
    }
}

/// One validated input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRow {
    pub batch_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Timestamp,
}

/// A row after labeling. Created once per detection run and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub batch_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Timestamp,
    pub is_anomaly: bool,
    /// Epoch seconds at label time
    pub scanned_at: i64,
}

impl ScanRecord {
    pub fn labeled(row: &ScanRow, is_anomaly: bool, scanned_at: i64) -> Self {
        Self {
            batch_id: row.batch_id.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            timestamp: row.timestamp.clone(),
            is_anomaly,
            scanned_at,
        }
    }
}
