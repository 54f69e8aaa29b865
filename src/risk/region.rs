//! Latitude bands used for regional risk aggregation.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Northern Nigeria")]
    Northern,
    #[serde(rename = "Central Nigeria")]
    Central,
    #[serde(rename = "Southern Nigeria")]
    Southern,
}

impl Region {
    /// Total over the real line: anything not above 7 (NaN included) is Southern.
    pub fn classify(latitude: f64) -> Self {
        if latitude > 11.0 {
            Region::Northern
        } else if latitude > 7.0 {
            Region::Central
        } else {
            Region::Southern
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Northern => "Northern Nigeria",
            Region::Central => "Central Nigeria",
            Region::Southern => "Southern Nigeria",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
