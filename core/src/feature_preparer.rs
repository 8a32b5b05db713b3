//! Feature preparation — raw record batch to numeric feature table.
//!
//! Steps, in order:
//!   1. Rule score and risk category are attached (recomputed from raw
//!      attributes, so a missing or stale cache never leaks in)
//!   2. Present columns are partitioned into numeric and categorical
//!   3. Missing numeric values take the column median, missing categorical
//!      values the most frequent value
//!   4. Categorical columns are one-hot encoded, first level dropped
//!
//! The identifier, `Name`, hybrid outputs and pass-through columns never
//! become features.

use crate::{
    error::{CrrError, CrrResult},
    record::{AttributeKind, RecordBatch, CRR_SCORE_COLUMN, RISK_CATEGORY_COLUMN},
    risk_tier::RiskTier,
    rule_scorer::crr_score,
    types::ColumnName,
};
use std::collections::{BTreeMap, BTreeSet};

/// A dense, row-major, fully numeric table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<ColumnName>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<ColumnName>, rows: Vec<Vec<f64>>) -> CrrResult<Self> {
        let unique: BTreeSet<&ColumnName> = columns.iter().collect();
        if unique.len() != columns.len() {
            return Err(CrrError::schema("feature table has duplicate column names"));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(CrrError::schema(format!(
                "row {i} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// A table with the given columns and `n_rows` rows of zeros.
    pub fn zeros(columns: Vec<ColumnName>, n_rows: usize) -> Self {
        let width = columns.len();
        Self { columns, rows: vec![vec![0.0; width]; n_rows] }
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Keep only the columns for which `keep` returns true, in order.
    pub fn retain_columns(&self, keep: impl Fn(&str) -> bool) -> Self {
        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|&i| keep(&self.columns[i]))
            .collect();
        Self {
            columns: kept.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| kept.iter().map(|&i| r[i]).collect())
                .collect(),
        }
    }

    /// Subset of rows, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Name of the indicator column for `value` of categorical `column`.
pub fn indicator_column(column: &str, value: &str) -> ColumnName {
    format!("{column}_{value}")
}

/// Convert a raw batch into a model-ready feature table.
pub fn prepare_features(batch: &RecordBatch) -> CrrResult<FeatureTable> {
    let scores: Vec<i64> = batch.records.iter().map(crr_score).collect();

    let mut numeric: Vec<(ColumnName, Vec<Option<f64>>)> = Vec::new();
    let mut categorical: Vec<(ColumnName, Vec<Option<String>>)> = Vec::new();

    for attr in &batch.attributes {
        match attr.kind() {
            AttributeKind::Numeric => numeric.push((
                attr.column().to_string(),
                batch
                    .records
                    .iter()
                    .map(|r| r.get(*attr).and_then(|v| v.as_f64()))
                    .collect(),
            )),
            AttributeKind::Categorical => categorical.push((
                attr.column().to_string(),
                batch
                    .records
                    .iter()
                    .map(|r| r.get(*attr).map(|v| v.to_string()))
                    .collect(),
            )),
            AttributeKind::Identity => {}
        }
    }

    numeric.push((
        CRR_SCORE_COLUMN.to_string(),
        scores.iter().map(|&s| Some(s as f64)).collect(),
    ));
    categorical.push((
        RISK_CATEGORY_COLUMN.to_string(),
        scores
            .iter()
            .map(|&s| Some(RiskTier::from_score(s as f64).label().to_string()))
            .collect(),
    ));

    let n_rows = batch.len();
    let mut columns: Vec<ColumnName> = Vec::new();
    let mut data: Vec<Vec<f64>> = Vec::new();

    for (name, values) in numeric {
        let filled = impute_median(&name, &values)?;
        columns.push(name);
        data.push(filled);
    }

    for (name, values) in categorical {
        let filled = impute_most_frequent(&name, &values)?;
        for (indicator, column) in one_hot(&name, &filled) {
            columns.push(indicator);
            data.push(column);
        }
    }

    let rows = (0..n_rows)
        .map(|i| data.iter().map(|col| col[i]).collect())
        .collect();
    FeatureTable::new(columns, rows)
}

fn impute_median(column: &str, values: &[Option<f64>]) -> CrrResult<Vec<f64>> {
    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.len() == values.len() {
        return Ok(observed);
    }
    if observed.is_empty() {
        return Err(CrrError::ImputationUndefined { column: column.to_string() });
    }
    observed.sort_by(f64::total_cmp);
    let mid = observed.len() / 2;
    let median = if observed.len() % 2 == 0 {
        (observed[mid - 1] + observed[mid]) / 2.0
    } else {
        observed[mid]
    };
    log::debug!("imputing {column} with median {median}");
    Ok(values.iter().map(|v| v.unwrap_or(median)).collect())
}

fn impute_most_frequent(column: &str, values: &[Option<String>]) -> CrrResult<Vec<String>> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_default() += 1;
    }
    if counts.values().sum::<usize>() == values.len() {
        return Ok(values.iter().flatten().cloned().collect());
    }
    // BTreeMap iterates in key order, so ties go to the smallest value.
    let mut best: Option<(&str, usize)> = None;
    for (&v, &n) in &counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((v, n));
        }
    }
    let mode = best
        .map(|(v, _)| v.to_string())
        .ok_or_else(|| CrrError::ImputationUndefined { column: column.to_string() })?;
    log::debug!("imputing {column} with most frequent value '{mode}'");
    Ok(values
        .iter()
        .map(|v| v.clone().unwrap_or_else(|| mode.clone()))
        .collect())
}

/// Indicator columns for every level except the lexicographically first.
fn one_hot(column: &str, values: &[String]) -> Vec<(ColumnName, Vec<f64>)> {
    let levels: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    levels
        .into_iter()
        .skip(1)
        .map(|level| {
            let indicator = values
                .iter()
                .map(|v| if v == level { 1.0 } else { 0.0 })
                .collect();
            (indicator_column(column, level), indicator)
        })
        .collect()
}
