//! Service configuration. Loaded from a JSON file; every section has defaults.

use crate::hotspot::HotspotRule;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Outlier model parameters
    pub detector: DetectorConfig,
    /// Risk level banding
    pub risk: RiskConfig,
    /// Extra hotspot rules, evaluated after the built-in table
    pub hotspots: HotspotsConfig,
    /// Durable persistence of scan records
    pub store: StoreConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of isolation trees in the ensemble
    pub n_trees: usize,
    /// Rows sampled per tree (capped at batch size)
    pub max_samples: usize,
    /// Expected anomalous fraction of a batch, in (0, 0.5]
    pub contamination: f64,
    /// Seed for tree construction
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score above this is high risk (0.0–1.0)
    pub high_threshold: f64,
    /// Score above this is medium risk
    pub medium_threshold: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotsConfig {
    pub extra_rules: Vec<HotspotRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Sqlite,
    Document,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory holding the SQLite file
    pub data_dir: PathBuf,
    /// Environment variable carrying the encryption secret
    pub secret_env: String,
    /// Document store base URL (document backend only)
    pub endpoint: Option<String>,
    /// Collection name records are written to
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.2,
            seed: 42,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.6,
            medium_threshold: 0.3,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            data_dir: PathBuf::from(".tracerx"),
            secret_env: "TRACERX_STORE_SECRET".to_string(),
            endpoint: None,
            collection: "drug_scans".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ServiceConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<ServiceConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults")
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let c: ServiceConfig =
            serde_json::from_str(r#"{"detector": {"seed": 7}, "store": {"backend": "none"}}"#).unwrap();
        assert_eq!(c.detector.seed, 7);
        assert_eq!(c.detector.n_trees, 100);
        assert_eq!(c.detector.contamination, 0.2);
        assert_eq!(c.store.backend, StoreBackend::None);
        assert_eq!(c.store.collection, "drug_scans");
    }
}
