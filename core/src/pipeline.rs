//! The batch scoring pipeline.
//!
//! EXECUTION ORDER per table (fixed):
//!   1. Read the whole table from the store
//!   2. Load the trained model, or train and save one  (hybrid, first table only)
//!   3. Rule scores, then the hybrid blend
//!   4. Destructively replace the stored table
//!
//! RULES:
//!   - Each run recomputes every derived column from raw attributes.
//!     The rule-only pass re-blends a stored `ML_CRR_Pred` rather than
//!     calling the estimator.
//!   - One hybrid run uses one model for every table.
//!   - Tables are processed in configuration order; one failure aborts
//!     the run and leaves the failing table untouched.
//!   - Runs against the same database must be serialized by the caller.

use crate::{
    config::{PipelineConfig, TableConfig},
    error::CrrResult,
    hybrid_predictor::{hybrid_predict, reblend_stored, ReconciliationReport},
    model::TrainedModel,
    record::RecordBatch,
    rule_scorer::{apply_rule_scores, crr_score},
    store::CardholderStore,
    summary::TierSummary,
};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    pub summary: TierSummary,
    /// Records whose cached `CRR_Score` disagreed with the raw attributes.
    pub drifted_scores: usize,
    /// None for the rule-only pass.
    pub reconciliation: Option<ReconciliationReport>,
}

pub struct ScoringPipeline {
    config: PipelineConfig,
    pub store: CardholderStore,
}

impl ScoringPipeline {
    pub fn new(config: PipelineConfig, store: CardholderStore) -> CrrResult<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    /// Open the store at `config.db_path` and build the pipeline.
    pub fn open(config: PipelineConfig) -> CrrResult<Self> {
        let store = CardholderStore::open(&config.db_path)?;
        Self::new(config, store)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Rule-only pass: attach `CRR_Score` and `RiskCategory`, then replace.
    /// A stored `ML_CRR_Pred` is re-blended against the new rule score.
    pub fn score_table(&self, table: &TableConfig) -> CrrResult<TableOutcome> {
        let mut batch = self.store.read_table(table)?;
        let drifted_scores = apply_rule_scores(&mut batch);
        let reblended = reblend_stored(&mut batch, self.config.alpha)?;
        if reblended > 0 {
            log::debug!("re-blended {reblended} stored predictions in '{}'", table.name);
        }
        self.store.replace_table(table, &batch)?;
        log::info!("Updated '{}' with CRR scores and risk categories.", table.name);
        Ok(TableOutcome {
            summary: TierSummary::from_batch(&table.name, &batch),
            drifted_scores,
            reconciliation: None,
        })
    }

    pub fn score_all(&self) -> CrrResult<Vec<TableOutcome>> {
        self.config.tables.iter().map(|t| self.score_table(t)).collect()
    }

    /// Load the configured model artifact, training on `batch` when it is
    /// missing or a retrain was requested.
    pub fn load_or_train_model(&self, batch: &RecordBatch) -> CrrResult<TrainedModel> {
        TrainedModel::load_or_train(
            Path::new(&self.config.model_path),
            self.config.retrain,
            batch,
            &self.config.forest,
        )
    }

    /// Hybrid pass for one table with a model already in hand.
    pub fn run_hybrid_table(&self, table: &TableConfig, model: &TrainedModel) -> CrrResult<TableOutcome> {
        let batch = self.store.read_table(table)?;
        self.enrich_and_replace(table, batch, model)
    }

    /// Hybrid pass over every configured table. The model is resolved once,
    /// against the first table; every table is scored with that model.
    pub fn run_hybrid(&self) -> CrrResult<Vec<TableOutcome>> {
        let Some((first, rest)) = self.config.tables.split_first() else {
            return Ok(Vec::new());
        };
        let batch = self.store.read_table(first)?;
        let model = self.load_or_train_model(&batch)?;

        let mut outcomes = Vec::with_capacity(self.config.tables.len());
        outcomes.push(self.enrich_and_replace(first, batch, &model)?);
        for table in rest {
            outcomes.push(self.run_hybrid_table(table, &model)?);
        }
        Ok(outcomes)
    }

    /// Tier counts of every configured table, as currently stored.
    pub fn summarize(&self) -> CrrResult<Vec<TierSummary>> {
        self.config
            .tables
            .iter()
            .map(|t| {
                let batch = self.store.read_table(t)?;
                Ok(TierSummary::from_batch(&t.name, &batch))
            })
            .collect()
    }

    fn enrich_and_replace(
        &self,
        table: &TableConfig,
        mut batch: RecordBatch,
        model: &TrainedModel,
    ) -> CrrResult<TableOutcome> {
        let drifted_scores = batch
            .records
            .iter()
            .filter(|r| r.crr_score.is_some_and(|s| s != crr_score(r)))
            .count();

        let report = hybrid_predict(&mut batch, &model.forest, &model.manifest, self.config.alpha)?;
        self.store.replace_table(table, &batch)?;
        log::info!(
            "Updated '{}' with ML_CRR_Pred, Hybrid_CRR, and Hybrid_Risk columns.",
            table.name
        );

        Ok(TableOutcome {
            summary: TierSummary::from_batch(&table.name, &batch),
            drifted_scores,
            reconciliation: Some(report),
        })
    }
}
