//! Per-tier head counts for a scored batch.

use crate::{record::RecordBatch, risk_tier::RiskTier};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unscored: usize,
}

impl TierCounts {
    fn add(&mut self, tier: Option<RiskTier>) {
        match tier {
            Some(RiskTier::High) => self.high += 1,
            Some(RiskTier::Medium) => self.medium += 1,
            Some(RiskTier::Low) => self.low += 1,
            None => self.unscored += 1,
        }
    }

    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Medium => self.medium,
            RiskTier::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.unscored
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub table: String,
    pub rows: usize,
    pub rule: TierCounts,
    pub hybrid: TierCounts,
    pub mean_crr_score: Option<f64>,
    pub mean_hybrid_crr: Option<f64>,
}

impl TierSummary {
    pub fn from_batch(table: &str, batch: &RecordBatch) -> Self {
        let mut rule = TierCounts::default();
        let mut hybrid = TierCounts::default();
        for r in &batch.records {
            rule.add(r.risk_category);
            hybrid.add(r.hybrid_risk);
        }
        Self {
            table: table.to_string(),
            rows: batch.len(),
            rule,
            hybrid,
            mean_crr_score: mean(batch.records.iter().filter_map(|r| r.crr_score.map(|s| s as f64))),
            mean_hybrid_crr: mean(batch.records.iter().filter_map(|r| r.hybrid_crr)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl fmt::Display for TierSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ({} rows) ===", self.table, self.rows)?;
        writeln!(f, "  {:<12} {:>8} {:>8}", "tier", "rule", "hybrid")?;
        for tier in RiskTier::ALL {
            writeln!(
                f,
                "  {:<12} {:>8} {:>8}",
                tier.label(),
                self.rule.get(tier),
                self.hybrid.get(tier)
            )?;
        }
        writeln!(f, "  {:<12} {:>8} {:>8}", "unscored", self.rule.unscored, self.hybrid.unscored)?;
        match (self.mean_crr_score, self.mean_hybrid_crr) {
            (Some(r), Some(h)) => writeln!(f, "  mean score   {r:>8.1} {h:>8.1}"),
            (Some(r), None) => writeln!(f, "  mean score   {r:>8.1} {:>8}", "-"),
            _ => Ok(()),
        }
    }
}
