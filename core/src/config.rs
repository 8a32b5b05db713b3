use crate::{
    error::{CrrError, CrrResult},
    hybrid_predictor::DEFAULT_ALPHA,
    types::TableName,
};
use serde::{Deserialize, Serialize};

/// A stored cardholder table and the column that identifies its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: TableName,
    pub id_column: String,
}

impl TableConfig {
    pub fn new(name: impl Into<String>, id_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_column: id_column.into(),
        }
    }

    pub fn individuals() -> Self {
        Self::new("IndividualCardholders", "CustomerID")
    }

    pub fn companies() -> Self {
        Self::new("CompanyCardholders", "EntityID")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// None grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    /// Share of rows held out to measure R² and MAE after training.
    pub test_fraction: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 250,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            test_fraction: 0.2,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> CrrResult<()> {
        if self.n_estimators == 0 {
            return Err(CrrError::config("n_estimators must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(CrrError::config("min_samples_split must be at least 2"));
        }
        if self.min_samples_leaf == 0 {
            return Err(CrrError::config("min_samples_leaf must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(CrrError::config(format!(
                "test_fraction {} outside [0, 1)",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

/// Everything the batch pipeline needs, threaded explicitly through
/// `ScoringPipeline::new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub db_path: String,
    /// Weight of the learned score in the hybrid blend.
    pub alpha: f64,
    pub model_path: String,
    /// Train a fresh model even if `model_path` already exists.
    pub retrain: bool,
    pub tables: Vec<TableConfig>,
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: "card_risk.db".into(),
            alpha: DEFAULT_ALPHA,
            model_path: "rf_crr_model.json".into(),
            retrain: false,
            tables: vec![TableConfig::individuals(), TableConfig::companies()],
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CrrResult<()> {
        validate_alpha(self.alpha)?;
        if self.tables.is_empty() {
            return Err(CrrError::config("no tables configured"));
        }
        if let Some(t) = self
            .tables
            .iter()
            .find(|t| t.name.trim().is_empty() || t.id_column.trim().is_empty())
        {
            return Err(CrrError::config(format!(
                "table '{}' needs a name and an id_column",
                t.name
            )));
        }
        self.forest.validate()
    }
}

/// Blend weight must lie in [0, 1]. NaN is rejected.
pub fn validate_alpha(alpha: f64) -> CrrResult<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(CrrError::config(format!("alpha {alpha} outside [0, 1]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn alpha_out_of_range_rejected() {
        assert!(validate_alpha(1.01).is_err());
        assert!(validate_alpha(-0.1).is_err());
        assert!(validate_alpha(f64::NAN).is_err());
        assert!(validate_alpha(0.0).is_ok());
        assert!(validate_alpha(1.0).is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "alpha": 0.25, "forest": { "n_estimators": 10 } }"#).unwrap();
        assert_eq!(config.alpha, 0.25);
        assert_eq!(config.forest.n_estimators, 10);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.tables[1].id_column, "EntityID");
    }
}
