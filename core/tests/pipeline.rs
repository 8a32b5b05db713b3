//! End-to-end pipeline runs against an in-memory store and a temp model file.

mod common;

use crr_core::{
    config::{PipelineConfig, TableConfig},
    error::CrrError,
    model::TrainedModel,
    pipeline::ScoringPipeline,
    record::Attribute,
    risk_tier::RiskTier,
    rule_scorer::apply_rule_scores,
    store::CardholderStore,
};
use std::path::Path;
use tempfile::tempdir;

fn pipeline(config: PipelineConfig) -> ScoringPipeline {
    let pipeline = ScoringPipeline::new(config, CardholderStore::in_memory().unwrap()).unwrap();
    pipeline
        .store
        .replace_table(&TableConfig::individuals(), &common::individuals(40))
        .unwrap();
    pipeline
        .store
        .replace_table(&TableConfig::companies(), &common::companies(10))
        .unwrap();
    pipeline
}

#[test]
fn hybrid_run_trains_on_first_table_and_reuses_for_second() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let p = pipeline(common::test_config(&model_path));

    let outcomes = p.run_hybrid().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(model_path.exists());

    let model = TrainedModel::load(&model_path).unwrap();
    assert!(model.manifest.contains("MaritalStatus_Single"));
    assert!(!model.manifest.contains("CRR_Score"));
    assert!(model.manifest.columns().iter().all(|c| !c.starts_with("RiskCategory")));
    let metrics = model.metrics.as_ref().unwrap();
    assert_eq!(metrics.train_rows + metrics.test_rows, 40);

    // Individuals were trained on: only the target columns are dropped.
    let individuals = outcomes[0].reconciliation.as_ref().unwrap();
    assert!(individuals.added.is_empty());
    assert!(!individuals.reordered);
    assert!(individuals
        .dropped
        .iter()
        .all(|c| c == "CRR_Score" || c.starts_with("RiskCategory_")));

    let companies = outcomes[1].reconciliation.as_ref().unwrap();
    assert!(companies.added.contains(&"MaritalStatus_Single".to_string()));
    assert!(companies.dropped.contains(&"ProductType_Platinum".to_string()));
    assert_eq!(outcomes[1].summary.rows, 10);
}

#[test]
fn hybrid_columns_are_persisted() {
    let dir = tempdir().unwrap();
    let config = common::test_config(&dir.path().join("model.json"));
    let alpha = config.alpha;
    let p = pipeline(config);
    p.run_hybrid().unwrap();

    let individuals = p.store.read_table(&TableConfig::individuals()).unwrap();
    let scores: Vec<f64> = individuals
        .records
        .iter()
        .map(|r| r.crr_score.unwrap() as f64)
        .collect();
    let lo = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for table in [TableConfig::individuals(), TableConfig::companies()] {
        let batch = p.store.read_table(&table).unwrap();
        for r in &batch.records {
            let crr = r.crr_score.unwrap() as f64;
            let ml = r.ml_crr_pred.unwrap();
            let hybrid = r.hybrid_crr.unwrap();
            assert!((hybrid - (alpha * ml + (1.0 - alpha) * crr)).abs() < 1e-9);
            assert_eq!(r.hybrid_risk, Some(RiskTier::from_score(hybrid)));
            assert_eq!(r.risk_category, Some(RiskTier::from_score(crr)));
            // Forest leaves average training targets.
            assert!(ml >= lo - 1e-9 && ml <= hi + 1e-9, "{ml} outside [{lo}, {hi}]");
        }
    }
}

#[test]
fn saved_model_is_reused_unless_retrain_requested() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let mut config = common::test_config(&model_path);

    let first = pipeline(config.clone());
    first.run_hybrid().unwrap();
    let before = TrainedModel::load(&model_path).unwrap();
    let preds: Vec<f64> = first
        .store
        .read_table(&TableConfig::companies())
        .unwrap()
        .records
        .iter()
        .map(|r| r.ml_crr_pred.unwrap())
        .collect();

    let second = pipeline(config.clone());
    second.run_hybrid().unwrap();
    let after = TrainedModel::load(&model_path).unwrap();
    assert_eq!(before.trained_at, after.trained_at);

    let again: Vec<f64> = second
        .store
        .read_table(&TableConfig::companies())
        .unwrap()
        .records
        .iter()
        .map(|r| r.ml_crr_pred.unwrap())
        .collect();
    for (a, b) in preds.iter().zip(&again) {
        assert!((a - b).abs() < 1e-9);
    }

    // Same data and seed: a retrain grows the same forest.
    config.retrain = true;
    pipeline(config).run_hybrid().unwrap();
    let retrained = TrainedModel::load(&model_path).unwrap();
    assert!(retrained.trained_at >= before.trained_at);
    assert_eq!(retrained.forest, before.forest);
    assert_eq!(retrained.manifest, before.manifest);
}

#[test]
fn retrain_fits_only_the_first_table() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let config = PipelineConfig {
        retrain: true,
        ..common::test_config(&model_path)
    };
    pipeline(config).run_hybrid().unwrap();

    let saved = TrainedModel::load(&model_path).unwrap();
    let metrics = saved.metrics.unwrap();
    assert_eq!(metrics.train_rows + metrics.test_rows, 40);
    assert!(saved.manifest.contains("MaritalStatus_Single"));
    assert!(!saved.manifest.contains("ProductType_Platinum"));
}

#[test]
fn rule_pass_reblends_stored_predictions() {
    let dir = tempdir().unwrap();
    let config = common::test_config(&dir.path().join("model.json"));
    let alpha = config.alpha;
    let p = pipeline(config);
    p.run_hybrid().unwrap();

    let table = TableConfig::individuals();
    let mut batch = p.store.read_table(&table).unwrap();
    let ml_before: Vec<Option<f64>> = batch.records.iter().map(|r| r.ml_crr_pred).collect();
    batch.records[1].set(Attribute::EmploymentStatus, Some("Unemployed".into()));
    batch.records[1].set(Attribute::Education, Some("High School".into()));
    p.store.replace_table(&table, &batch).unwrap();

    let outcomes = p.score_all().unwrap();
    assert_eq!(outcomes[0].drifted_scores, 1);

    let back = p.store.read_table(&table).unwrap();
    for (r, ml) in back.records.iter().zip(&ml_before) {
        assert_eq!(r.ml_crr_pred, *ml);
        let crr = r.crr_score.unwrap() as f64;
        let hybrid = r.hybrid_crr.unwrap();
        assert!((hybrid - (alpha * ml.unwrap() + (1.0 - alpha) * crr)).abs() < 1e-9);
        assert_eq!(r.hybrid_risk, Some(RiskTier::from_score(hybrid)));
    }
}

#[test]
fn rule_pass_corrects_stale_cached_scores() {
    let dir = tempdir().unwrap();
    let p = ScoringPipeline::new(
        common::test_config(&dir.path().join("model.json")),
        CardholderStore::in_memory().unwrap(),
    )
    .unwrap();

    let mut individuals = common::individuals(10);
    apply_rule_scores(&mut individuals);
    let correct = individuals.records[4].crr_score;
    individuals.records[4].crr_score = Some(99);
    p.store.replace_table(&TableConfig::individuals(), &individuals).unwrap();
    p.store.replace_table(&TableConfig::companies(), &common::companies(3)).unwrap();

    let outcomes = p.score_all().unwrap();
    assert_eq!(outcomes[0].drifted_scores, 1);
    assert_eq!(outcomes[1].drifted_scores, 0);
    assert!(outcomes.iter().all(|o| o.reconciliation.is_none()));

    let back = p.store.read_table(&TableConfig::individuals()).unwrap();
    assert_eq!(back.records[4].crr_score, correct);
    // The rule pass never trains a model.
    assert!(!Path::new(&p.config().model_path).exists());
}

#[test]
fn summary_counts_every_stored_row() {
    let dir = tempdir().unwrap();
    let p = pipeline(common::test_config(&dir.path().join("model.json")));
    p.run_hybrid().unwrap();

    let summaries = p.summarize().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].table, "IndividualCardholders");
    assert_eq!(summaries[0].rows, 40);
    assert_eq!(summaries[0].rule.total(), 40);
    assert_eq!(summaries[0].rule.unscored, 0);
    assert_eq!(summaries[1].hybrid.total(), 10);
    assert_eq!(summaries[1].hybrid.unscored, 0);
    assert!(summaries[0].mean_hybrid_crr.is_some());

    let rendered = summaries[0].to_string();
    assert!(rendered.contains("IndividualCardholders"));
    assert!(rendered.contains("High Risk"));
}

#[test]
fn malformed_model_file_is_an_error() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    std::fs::write(&model_path, "{ not a model").unwrap();

    let p = pipeline(common::test_config(&model_path));
    let err = p.run_hybrid().unwrap_err();
    assert!(matches!(err, CrrError::Serialization(_)), "got {err}");

    // Nothing was replaced.
    let batch = p.store.read_table(&TableConfig::individuals()).unwrap();
    assert!(batch.records.iter().all(|r| r.hybrid_crr.is_none()));
}

#[test]
fn empty_training_table_is_insufficient_data() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let p = ScoringPipeline::new(common::test_config(&model_path), CardholderStore::in_memory().unwrap())
        .unwrap();
    p.store
        .execute_batch("CREATE TABLE IndividualCardholders (CustomerID INTEGER, Income REAL);")
        .unwrap();

    let err = p.run_hybrid().unwrap_err();
    assert!(matches!(err, CrrError::InsufficientData { rows: 0 }));
    assert!(!model_path.exists());
}

#[test]
fn missing_table_aborts_the_run() {
    let dir = tempdir().unwrap();
    let p = ScoringPipeline::new(
        common::test_config(&dir.path().join("model.json")),
        CardholderStore::in_memory().unwrap(),
    )
    .unwrap();
    assert!(matches!(p.score_all(), Err(CrrError::TableNotFound { .. })));
}

#[test]
fn invalid_alpha_is_rejected_at_construction() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        alpha: 1.2,
        ..common::test_config(&dir.path().join("model.json"))
    };
    let result = ScoringPipeline::new(config, CardholderStore::in_memory().unwrap());
    assert!(matches!(result, Err(CrrError::InvalidConfig { .. })));
}
