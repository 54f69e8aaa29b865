//! TracerX AI — anomaly detection and regional risk for drug scan events.
//!
//! Modular structure:
//! - [`scan`] — Scan rows, labeled records, batch validation
//! - [`model`] — Isolation forest and per-batch anomaly detector
//! - [`history`] — Append-only in-memory scan history
//! - [`hotspot`] — Anomalous batch → city map markers
//! - [`risk`] — Region classification and historical risk scoring
//! - [`storage`] — Durable record stores (encrypted SQLite, document API)
//! - [`service`] — analyze / history / risk operations
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod scan;
pub mod model;
pub mod history;
pub mod hotspot;
pub mod risk;
pub mod storage;
pub mod service;
pub mod logging;

pub use config::ServiceConfig;
pub use error::{AnalyzeError, ModelError, StoreError, ValidationError};
pub use scan::{ScanRecord, ScanRow, Timestamp, ValidatedBatch};
pub use model::{AnomalyDetector, IsolationForest};
pub use history::HistoryStore;
pub use hotspot::{HotspotAggregator, HotspotEntry};
pub use risk::{Region, RiskScorer, RiskSnapshot};
pub use storage::{DurableStore, QueuedStore, SecureStore};
pub use service::ScanService;
pub use logging::StructuredLogger;
