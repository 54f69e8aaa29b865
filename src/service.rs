//! The three operations exposed to a request layer: analyze a batch, read
//! the history, and compute regional risk.

use crate::config::ServiceConfig;
use crate::error::{AnalyzeError, ModelError};
use crate::history::HistoryStore;
use crate::hotspot::{HotspotAggregator, HotspotEntry};
use crate::model::AnomalyDetector;
use crate::risk::{RiskScorer, RiskSnapshot};
use crate::scan::{validate, ScanRecord};
use crate::storage::DurableStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Request body of an analyze call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub scan_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub anomalies: Vec<String>,
    pub prediction: String,
    pub hotspots: Vec<HotspotEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<ScanRecord>,
    pub total_scans: usize,
    pub timestamp: i64,
}

pub fn prediction_text(anomalies: usize) -> String {
    format!("{anomalies} suspicious batches detected")
}

pub struct ScanService {
    history: Arc<HistoryStore>,
    detector: AnomalyDetector,
    hotspots: HotspotAggregator,
    risk: RiskScorer,
}

impl ScanService {
    /// Wire the pipeline around a fresh, empty history.
    pub fn new(config: &ServiceConfig, store: Arc<dyn DurableStore>) -> Result<Self, ModelError> {
        let history = Arc::new(HistoryStore::new());
        let detector = AnomalyDetector::new(config.detector.clone(), Arc::clone(&history), store)?;
        let hotspots = HotspotAggregator::with_extra(config.hotspots.extra_rules.iter().cloned());
        let risk = RiskScorer::new(config.risk.clone(), Arc::clone(&history));
        Ok(Self {
            history,
            detector,
            hotspots,
            risk,
        })
    }

    /// Validate, label, record and map one batch.
    pub fn analyze(&self, raw: Option<&Value>) -> Result<AnalysisResponse, AnalyzeError> {
        let batch = validate(raw)?;
        let anomalies = self.detector.detect(&batch)?;
        let hotspots = self.hotspots.aggregate(&anomalies);
        Ok(AnalysisResponse {
            prediction: prediction_text(anomalies.len()),
            anomalies,
            hotspots,
        })
    }

    pub fn analyze_request(&self, request: &AnalyzeRequest) -> Result<AnalysisResponse, AnalyzeError> {
        self.analyze(request.scan_data.as_ref())
    }

    pub fn get_history(&self) -> HistoryResponse {
        let history = self.history.snapshot();
        HistoryResponse {
            total_scans: history.len(),
            history,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn predict_risk(&self) -> RiskSnapshot {
        self.risk.predict()
    }

    pub fn risk(&self) -> &RiskScorer {
        &self.risk
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }
}
