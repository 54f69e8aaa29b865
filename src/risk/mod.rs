//! Region classification and historical risk scoring.

mod engine;
mod region;

pub use engine::{risk_scores, RegionCounts, RiskLevel, RiskScorer, RiskSnapshot};
pub use region::Region;
