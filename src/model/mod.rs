//! Unsupervised outlier model and the per-batch detector built on it.

mod detector;
mod forest;

pub use detector::{anomaly_count, label_top, AnomalyDetector};
pub use forest::{average_path_length, IsolationForest};
