//! Risk categorizer — maps a score onto one of three ordinal tiers.
//!
//! Lower bounds are inclusive: exactly 75 is Low, exactly 50 is Medium.
//! The same thresholds apply to integer rule scores and real hybrid scores.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const LOW_RISK_FLOOR: f64 = 75.0;
pub const MEDIUM_RISK_FLOOR: f64 = 50.0;

/// Ordered from least to most creditworthy, so `from_score` is monotonic
/// non-decreasing in the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [Self::High, Self::Medium, Self::Low];

    /// NaN falls through to High.
    pub fn from_score(score: f64) -> Self {
        if score >= LOW_RISK_FLOOR {
            Self::Low
        } else if score >= MEDIUM_RISK_FLOOR {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Medium => "Medium Risk",
            Self::Low => "Low Risk",
        }
    }

    /// Accepts the stored labels and the bare tier words, any case.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let word = s.strip_suffix(" risk").unwrap_or(&s);
        match word {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
