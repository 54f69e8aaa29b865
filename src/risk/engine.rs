//! Aggregates the scan history by region into anomaly-rate risk scores.

use super::Region;
use crate::config::RiskConfig;
use crate::history::HistoryStore;
use crate::scan::ScanRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64, config: &RiskConfig) -> Self {
        if score > config.high_threshold {
            RiskLevel::High
        } else if score > config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionCounts {
    pub total: u64,
    pub anomalies: u64,
}

/// Region → risk score, plus the time it was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub region_risk: BTreeMap<String, f64>,
    pub generated_at: i64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn tally(mut counts: BTreeMap<Region, RegionCounts>, record: &ScanRecord) -> BTreeMap<Region, RegionCounts> {
    let c = counts.entry(Region::classify(record.latitude)).or_default();
    c.total += 1;
    if record.is_anomaly {
        c.anomalies += 1;
    }
    counts
}

/// `anomalies / total` rounded to two decimals, keyed by region name.
pub fn risk_scores(counts: &BTreeMap<Region, RegionCounts>) -> BTreeMap<String, f64> {
    counts
        .iter()
        .filter(|(_, c)| c.total > 0)
        .map(|(region, c)| (region.name().to_string(), round2(c.anomalies as f64 / c.total as f64)))
        .collect()
}

pub struct RiskScorer {
    config: RiskConfig,
    history: Arc<HistoryStore>,
}

impl RiskScorer {
    pub fn new(config: RiskConfig, history: Arc<HistoryStore>) -> Self {
        Self { config, history }
    }

    /// Per-region totals. One read lock over the history, so a batch being
    /// appended is counted entirely or not at all. Regions with no records
    /// are absent.
    pub fn region_counts(&self) -> BTreeMap<Region, RegionCounts> {
        self.history.fold(BTreeMap::new(), tally)
    }

    pub fn predict(&self) -> RiskSnapshot {
        RiskSnapshot {
            region_risk: risk_scores(&self.region_counts()),
            generated_at: Utc::now().timestamp(),
        }
    }

    /// Like [`predict`](Self::predict), keeping regions whose name contains `query` (case-insensitive).
    pub fn predict_for(&self, query: &str) -> RiskSnapshot {
        let query = query.to_lowercase();
        let mut snapshot = self.predict();
        snapshot
            .region_risk
            .retain(|name, _| name.to_lowercase().contains(&query));
        snapshot
    }

    pub fn levels(&self, snapshot: &RiskSnapshot) -> BTreeMap<String, RiskLevel> {
        snapshot
            .region_risk
            .iter()
            .map(|(name, &score)| (name.clone(), RiskLevel::from_score(score, &self.config)))
            .collect()
    }
}
