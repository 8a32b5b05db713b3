//! Feature preparation: back-fill, imputation, encoding.

mod common;

use crr_core::{
    error::CrrError,
    feature_preparer::prepare_features,
    record::{Attribute, Record, RecordBatch},
};

fn three_cardholders() -> RecordBatch {
    RecordBatch::from_records(
        "CustomerID",
        vec![
            Record::new(1i64)
                .with(Attribute::Income, 50_000i64)
                .with(Attribute::EmploymentStatus, "Full-Time")
                .with(Attribute::ProductType, "Gold"),
            Record::new(2i64)
                .with(Attribute::EmploymentStatus, "Part-Time")
                .with(Attribute::ProductType, "Standard"),
            Record::new(3i64)
                .with(Attribute::Income, 70_000i64)
                .with(Attribute::ProductType, "Gold"),
        ],
    )
}

#[test]
fn columns_follow_schema_order_with_first_level_dropped() {
    let table = prepare_features(&three_cardholders()).unwrap();
    assert_eq!(
        table.columns(),
        &[
            "Income".to_string(),
            "CRR_Score".to_string(),
            "EmploymentStatus_Part-Time".to_string(),
            "ProductType_Standard".to_string(),
        ]
    );
    assert_eq!(table.n_rows(), 3);
}

#[test]
fn rule_score_is_backfilled_into_features() {
    let table = prepare_features(&three_cardholders()).unwrap();
    // 5+10+3 / 0+5+5 / 5+0+3, each plus marital default 1 and identity 2.
    assert_eq!(table.column("CRR_Score").unwrap(), vec![21.0, 13.0, 11.0]);
}

#[test]
fn missing_values_are_imputed() {
    let table = prepare_features(&three_cardholders()).unwrap();
    assert_eq!(table.column("Income").unwrap(), vec![50_000.0, 60_000.0, 70_000.0]);
    // Full-Time and Part-Time tie; the smaller value wins.
    assert_eq!(
        table.column("EmploymentStatus_Part-Time").unwrap(),
        vec![0.0, 1.0, 0.0]
    );
}

#[test]
fn unparsable_numeric_is_treated_as_missing() {
    let batch = RecordBatch::from_records(
        "CustomerID",
        vec![
            Record::new(1i64).with(Attribute::Savings, 1_000i64),
            Record::new(2i64).with(Attribute::Savings, "plenty"),
            Record::new(3i64).with(Attribute::Savings, "3000"),
        ],
    );
    let table = prepare_features(&batch).unwrap();
    assert_eq!(table.column("Savings").unwrap(), vec![1_000.0, 2_000.0, 3_000.0]);
}

#[test]
fn risk_category_is_encoded_when_tiers_differ() {
    let batch = RecordBatch::from_records(
        "CustomerID",
        vec![common::reference_record(), Record::new(2i64).with(Attribute::Income, 10i64)],
    );
    let table = prepare_features(&batch).unwrap();
    // Levels are "High Risk" < "Low Risk"; the first is dropped.
    assert_eq!(table.column("RiskCategory_Low Risk").unwrap(), vec![1.0, 0.0]);
    assert!(table.column_index("RiskCategory_High Risk").is_none());
}

#[test]
fn identity_and_passthrough_columns_are_not_features() {
    let mut batch = common::individuals(6);
    batch.extra_columns.push("BranchCode".into());
    for r in &mut batch.records {
        r.extra.push(("BranchCode".into(), Some("X1".into())));
    }
    let table = prepare_features(&batch).unwrap();
    assert!(table.columns().iter().all(|c| !c.starts_with("Name")));
    assert!(table.columns().iter().all(|c| !c.starts_with("BranchCode")));
    assert!(table.column_index("CustomerID").is_none());
}

#[test]
fn absent_column_contributes_nothing() {
    let table = prepare_features(&common::companies(4)).unwrap();
    assert!(table.columns().iter().all(|c| !c.starts_with("MaritalStatus")));
}

#[test]
fn present_but_empty_column_is_an_error() {
    let batch = RecordBatch::new(
        "CustomerID",
        vec![Attribute::Income, Attribute::Savings],
        vec![
            Record::new(1i64).with(Attribute::Income, 45_000i64),
            Record::new(2i64).with(Attribute::Income, 85_000i64),
        ],
    );
    match prepare_features(&batch) {
        Err(CrrError::ImputationUndefined { column }) => assert_eq!(column, "Savings"),
        other => panic!("expected ImputationUndefined, got {other:?}"),
    }
}

#[test]
fn empty_categorical_column_is_an_error() {
    let batch = RecordBatch::new(
        "CustomerID",
        vec![Attribute::Education],
        vec![Record::new(1i64), Record::new(2i64)],
    );
    assert!(matches!(
        prepare_features(&batch),
        Err(CrrError::ImputationUndefined { ref column }) if column == "Education"
    ));
}

#[test]
fn empty_batch_yields_empty_table() {
    let batch = RecordBatch::new("CustomerID", vec![Attribute::Income], vec![]);
    let table = prepare_features(&batch).unwrap();
    assert_eq!(table.n_rows(), 0);
    assert_eq!(table.columns(), &["Income".to_string(), "CRR_Score".to_string()]);
}
