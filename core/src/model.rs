//! Trained model artifact: forest + manifest, persisted as JSON.
//!
//! The target is `CRR_Score`. The score column and the `RiskCategory_*`
//! indicators are excluded from the training matrix, so the forest never
//! sees its own target. The manifest records the remaining columns in
//! training order.

use crate::{
    config::ForestConfig,
    error::{CrrError, CrrResult},
    estimator::{
        mean_absolute_error, r2_score, train_test_split, Estimator, FeatureManifest,
        HoldoutMetrics, RandomForest,
    },
    feature_preparer::{indicator_column, prepare_features, FeatureTable},
    record::{RecordBatch, CRR_SCORE_COLUMN, RISK_CATEGORY_COLUMN},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub forest: RandomForest,
    pub manifest: FeatureManifest,
    pub trained_at: DateTime<Utc>,
    /// None when the batch was too small to hold rows out.
    pub metrics: Option<HoldoutMetrics>,
}

/// Split a prepared table into training features and the rule-score target.
pub fn training_matrix(features: &FeatureTable) -> CrrResult<(FeatureTable, Vec<f64>)> {
    let target = features
        .column(CRR_SCORE_COLUMN)
        .ok_or_else(|| CrrError::schema(format!("prepared features lack {CRR_SCORE_COLUMN}")))?;
    let category_prefix = indicator_column(RISK_CATEGORY_COLUMN, "");
    let x = features.retain_columns(|c| c != CRR_SCORE_COLUMN && !c.starts_with(&category_prefix));
    Ok((x, target))
}

impl TrainedModel {
    pub fn train(batch: &RecordBatch, config: &ForestConfig) -> CrrResult<Self> {
        config.validate()?;
        let features = prepare_features(batch)?;
        let (x, y) = training_matrix(&features)?;
        if x.n_rows() == 0 {
            return Err(CrrError::InsufficientData { rows: 0 });
        }
        let manifest = FeatureManifest::new(x.columns().to_vec())?;

        let (train_idx, test_idx) = train_test_split(x.n_rows(), config.test_fraction, config.seed);
        let x_train = x.select_rows(&train_idx);
        let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();

        log::info!(
            "training random forest: {} trees, {} rows, {} features",
            config.n_estimators,
            x_train.n_rows(),
            x_train.n_cols()
        );
        let forest = RandomForest::fit(&x_train, &y_train, config)?;

        let metrics = if test_idx.is_empty() {
            log::warn!("no rows held out; skipping R² and MAE");
            None
        } else {
            let x_test = x.select_rows(&test_idx);
            let y_test: Vec<f64> = test_idx.iter().map(|&i| y[i]).collect();
            let y_pred = forest.predict(&x_test)?;
            let metrics = HoldoutMetrics {
                r2: r2_score(&y_test, &y_pred),
                mae: mean_absolute_error(&y_test, &y_pred),
                train_rows: train_idx.len(),
                test_rows: test_idx.len(),
            };
            log::info!("R² Score: {:.3}", metrics.r2);
            log::info!("MAE: {:.3}", metrics.mae);
            Some(metrics)
        };

        Ok(Self {
            forest,
            manifest,
            trained_at: Utc::now(),
            metrics,
        })
    }

    pub fn save(&self, path: &Path) -> CrrResult<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        log::info!("model and feature list saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> CrrResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.manifest.validate()?;
        if model.manifest.len() != model.forest.n_features() {
            return Err(CrrError::schema(format!(
                "manifest lists {} columns but forest was trained on {}",
                model.manifest.len(),
                model.forest.n_features()
            )));
        }
        Ok(model)
    }

    /// Reuse the artifact at `path` unless it is missing or `retrain` is set;
    /// otherwise train on `batch` and save.
    pub fn load_or_train(
        path: &Path,
        retrain: bool,
        batch: &RecordBatch,
        config: &ForestConfig,
    ) -> CrrResult<Self> {
        if path.exists() && !retrain {
            let model = Self::load(path)?;
            log::info!(
                "loaded existing model {} (trained {})",
                path.display(),
                model.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            return Ok(model);
        }
        let model = Self::train(batch, config)?;
        model.save(path)?;
        Ok(model)
    }
}
