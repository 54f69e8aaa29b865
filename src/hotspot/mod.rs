//! Map markers for anomalous batches near known cities.
//!
//! Rules are data: an ordered list of (matcher, marker). The first rule that
//! matches a batch id wins; ids matching no rule produce no marker.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Matcher {
    Contains(String),
    Prefix(String),
}

impl Matcher {
    pub fn matches(&self, batch_id: &str) -> bool {
        match self {
            Matcher::Contains(p) => batch_id.contains(p.as_str()),
            Matcher::Prefix(p) => batch_id.starts_with(p.as_str()),
        }
    }
}

/// Marker for one anomalous batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotEntry {
    #[serde(rename = "coords")]
    pub coordinates: [f64; 2],
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRule {
    pub matcher: Matcher,
    pub city: String,
    pub coordinates: [f64; 2],
    pub popup: String,
}

impl HotspotRule {
    pub fn contains(pattern: &str, city: &str, coordinates: [f64; 2], popup: &str) -> Self {
        Self {
            matcher: Matcher::Contains(pattern.to_string()),
            city: city.to_string(),
            coordinates,
            popup: popup.to_string(),
        }
    }

    fn entry(&self) -> HotspotEntry {
        HotspotEntry {
            coordinates: self.coordinates,
            popup: self.popup.clone(),
        }
    }
}

/// Built-in table, in priority order.
pub fn default_rules() -> Vec<HotspotRule> {
    vec![
        HotspotRule::contains("LAG", "Lagos", [6.5244, 3.3792], "Lagos: High Risk (5 incidents)"),
        HotspotRule::contains("KANO", "Kano", [12.0022, 8.5917], "Kano: Medium Risk (3 incidents)"),
        HotspotRule::contains("ABJ", "Abuja", [9.0765, 7.3985], "Abuja: Low Risk (2 incidents)"),
    ]
}

#[derive(Debug, Clone)]
pub struct HotspotAggregator {
    rules: Vec<HotspotRule>,
}

impl Default for HotspotAggregator {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl HotspotAggregator {
    pub fn new(rules: Vec<HotspotRule>) -> Self {
        Self { rules }
    }

    /// Built-in rules followed by `extra`.
    pub fn with_extra(extra: impl IntoIterator<Item = HotspotRule>) -> Self {
        let mut rules = default_rules();
        rules.extend(extra);
        Self::new(rules)
    }

    pub fn rules(&self) -> &[HotspotRule] {
        &self.rules
    }

    pub fn resolve(&self, batch_id: &str) -> Option<&HotspotRule> {
        self.rules.iter().find(|r| r.matcher.matches(batch_id))
    }

    /// One entry per matched id, in input order. Duplicates are kept.
    pub fn aggregate<S: AsRef<str>>(&self, anomalies: &[S]) -> Vec<HotspotEntry> {
        anomalies
            .iter()
            .filter_map(|id| self.resolve(id.as_ref()))
            .map(HotspotRule::entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let agg = HotspotAggregator::default();
        let out = agg.aggregate(&["LAGKANO-1"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].popup, "Lagos: High Risk (5 incidents)");
        assert_eq!(out[0].coordinates, [6.5244, 3.3792]);
    }

    #[test]
    fn unmatched_ids_are_dropped() {
        let agg = HotspotAggregator::default();
        assert!(agg.aggregate(&["XYZ-1"]).is_empty());
        let out = agg.aggregate(&["KANO01", "XYZ-1", "ABJ-7", "KANO02"]);
        let cities: Vec<_> = out.iter().map(|e| e.popup.split(':').next().unwrap()).collect();
        assert_eq!(cities, vec!["Kano", "Abuja", "Kano"]);
    }

    #[test]
    fn extra_rules_are_additive() {
        let sokoto = HotspotRule {
            matcher: Matcher::Prefix("SOK".into()),
            city: "Sokoto".into(),
            coordinates: [13.06, 5.24],
            popup: "Sokoto: Watch".into(),
        };
        let agg = HotspotAggregator::with_extra([sokoto]);
        assert_eq!(agg.rules().len(), 4);
        assert_eq!(agg.resolve("SOK-001").map(|r| r.city.as_str()), Some("Sokoto"));
        assert!(agg.resolve("X-SOK").is_none());
        // built-ins keep priority
        assert_eq!(agg.resolve("SOK-LAG").map(|r| r.city.as_str()), Some("Lagos"));
    }

    #[test]
    fn entry_serializes_with_coords_key() {
        let v = serde_json::to_value(&default_rules()[1].entry()).unwrap();
        assert_eq!(v["coords"][0], 12.0022);
        assert_eq!(v["popup"], "Kano: Medium Risk (3 incidents)");
    }
}
