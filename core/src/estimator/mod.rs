//! Trained estimator contract and feature manifest.
//!
//! An estimator is positional: it reads column `i` of every row as the
//! `i`-th feature it was trained on. Callers must reconcile a feature
//! table against the estimator's `FeatureManifest` before predicting.

mod forest;
mod metrics;

pub use forest::{RandomForest, RegressionTree};
pub use metrics::{mean_absolute_error, r2_score, train_test_split, HoldoutMetrics};

use crate::{
    error::{CrrError, CrrResult},
    feature_preparer::FeatureTable,
    types::ColumnName,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub trait Estimator {
    /// One prediction per row, in row order.
    fn predict(&self, features: &FeatureTable) -> CrrResult<Vec<f64>>;
}

/// Ordered list of the columns an estimator was trained on.
/// Immutable once the estimator is trained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureManifest(Vec<ColumnName>);

impl FeatureManifest {
    pub fn new(columns: Vec<ColumnName>) -> CrrResult<Self> {
        let manifest = Self(columns);
        manifest.validate()?;
        Ok(manifest)
    }

    /// Non-empty, no duplicates. Deserialized manifests bypass `new`, so
    /// consumers re-check before use.
    pub fn validate(&self) -> CrrResult<()> {
        if self.0.is_empty() {
            return Err(CrrError::schema("feature manifest is empty"));
        }
        let unique: BTreeSet<&ColumnName> = self.0.iter().collect();
        if unique.len() != self.0.len() {
            return Err(CrrError::schema("feature manifest has duplicate column names"));
        }
        if let Some(blank) = self.0.iter().find(|c| c.trim().is_empty()) {
            return Err(CrrError::schema(format!("feature manifest has a blank column name '{blank}'")));
        }
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }
}
