//! Hybrid predictor — blends the rule score with a learned estimate.
//!
//! Procedure:
//!   1. Prepare features from the raw batch
//!   2. Reconcile the feature table against the estimator's manifest
//!   3. Predict `ML_CRR_Pred`
//!   4. Ensure `CRR_Score` on the input records
//!   5. `Hybrid_CRR = alpha * ML_CRR_Pred + (1 - alpha) * CRR_Score`,
//!      `Hybrid_Risk` from the same thresholds as `RiskCategory`
//!
//! RULE: No record is ever dropped. Output row count and identifiers equal
//! the input's regardless of how much reconciliation was needed.

use crate::{
    config::validate_alpha,
    error::{CrrError, CrrResult},
    estimator::{Estimator, FeatureManifest},
    feature_preparer::{prepare_features, FeatureTable},
    record::RecordBatch,
    risk_tier::RiskTier,
    rule_scorer::apply_rule_scores,
    types::ColumnName,
};
use serde::Serialize;

pub const DEFAULT_ALPHA: f64 = 0.6;

/// What reconciliation had to do to fit a table to a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Manifest columns synthesised as zeros.
    pub added: Vec<ColumnName>,
    /// Table columns the manifest does not know.
    pub dropped: Vec<ColumnName>,
    /// True if surviving columns were not already in manifest order.
    pub reordered: bool,
}

impl ReconciliationReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty() && !self.reordered
    }
}

/// Reshape `features` to exactly the manifest's columns, in its order.
///
/// Missing columns are zero-filled, unknown columns dropped. Running this
/// on an already-aligned table returns an identical table.
pub fn reconcile(
    features: &FeatureTable,
    manifest: &FeatureManifest,
) -> CrrResult<(FeatureTable, ReconciliationReport)> {
    manifest.validate()?;

    let mut report = ReconciliationReport {
        dropped: features
            .columns()
            .iter()
            .filter(|c| !manifest.contains(c))
            .cloned()
            .collect(),
        ..ReconciliationReport::default()
    };

    let sources: Vec<Option<usize>> = manifest
        .columns()
        .iter()
        .map(|c| features.column_index(c))
        .collect();

    for (column, source) in manifest.columns().iter().zip(&sources) {
        if source.is_none() {
            report.added.push(column.clone());
        }
    }

    let surviving: Vec<usize> = sources.iter().flatten().copied().collect();
    report.reordered = surviving.windows(2).any(|w| w[0] > w[1]);

    let rows = features
        .rows()
        .iter()
        .map(|row| {
            sources
                .iter()
                .map(|src| src.map_or(0.0, |i| row[i]))
                .collect()
        })
        .collect();
    let aligned = FeatureTable::new(manifest.columns().to_vec(), rows)?;

    if aligned.columns() != manifest.columns() {
        return Err(CrrError::schema("reconciled columns do not match the manifest"));
    }
    Ok((aligned, report))
}

/// Convex combination of the learned and rule scores.
pub fn blend(alpha: f64, ml_pred: f64, rule_score: f64) -> f64 {
    if alpha == 1.0 {
        return ml_pred;
    }
    if alpha == 0.0 {
        return rule_score;
    }
    alpha * ml_pred + (1.0 - alpha) * rule_score
}

/// Re-derive `Hybrid_CRR` and `Hybrid_Risk` from a stored `ML_CRR_Pred`
/// and the current `CRR_Score`, without consulting the estimator.
///
/// Records with no stored prediction lose any stale hybrid values.
/// Returns the number of records re-blended.
pub fn reblend_stored(batch: &mut RecordBatch, alpha: f64) -> CrrResult<usize> {
    validate_alpha(alpha)?;
    let mut reblended = 0;
    for record in &mut batch.records {
        match (record.ml_crr_pred, record.crr_score) {
            (Some(ml_pred), Some(rule)) => {
                let hybrid = blend(alpha, ml_pred, rule as f64);
                record.hybrid_crr = Some(hybrid);
                record.hybrid_risk = Some(RiskTier::from_score(hybrid));
                reblended += 1;
            }
            _ => {
                record.hybrid_crr = None;
                record.hybrid_risk = None;
            }
        }
    }
    Ok(reblended)
}

/// Enrich `batch` in place with `ML_CRR_Pred`, `Hybrid_CRR` and
/// `Hybrid_Risk` (and `CRR_Score`/`RiskCategory` if they were absent).
pub fn hybrid_predict(
    batch: &mut RecordBatch,
    estimator: &dyn Estimator,
    manifest: &FeatureManifest,
    alpha: f64,
) -> CrrResult<ReconciliationReport> {
    validate_alpha(alpha)?;

    let features = prepare_features(batch)?;
    let (aligned, report) = reconcile(&features, manifest)?;
    if !report.is_noop() {
        log::debug!(
            "reconciled {} rows: {} zero-filled, {} dropped, reordered={}",
            aligned.n_rows(),
            report.added.len(),
            report.dropped.len(),
            report.reordered
        );
    }

    let predictions = estimator.predict(&aligned)?;
    if predictions.len() != batch.len() {
        return Err(CrrError::schema(format!(
            "estimator returned {} predictions for {} records",
            predictions.len(),
            batch.len()
        )));
    }

    apply_rule_scores(batch);

    for (record, ml_pred) in batch.records.iter_mut().zip(predictions) {
        let rule = record.crr_score.unwrap_or_default() as f64;
        let hybrid = blend(alpha, ml_pred, rule);
        record.ml_crr_pred = Some(ml_pred);
        record.hybrid_crr = Some(hybrid);
        record.hybrid_risk = Some(RiskTier::from_score(hybrid));
    }

    Ok(report)
}
