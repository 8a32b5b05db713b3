//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use crr_core::{
    config::{ForestConfig, PipelineConfig, TableConfig},
    record::{Attribute, Record, RecordBatch},
};
use std::path::Path;

/// The reference applicant: every attribute in its best or near-best band.
pub fn reference_record() -> Record {
    Record::new(1i64)
        .with(Attribute::Income, 90_000i64)
        .with(Attribute::EmploymentStatus, "Full-Time")
        .with(Attribute::RepaymentHistory, 95i64)
        .with(Attribute::Bankruptcies, 0i64)
        .with(Attribute::OpenCreditLines, 3i64)
        .with(Attribute::CardLimit, 5_000i64)
        .with(Attribute::Age, 35i64)
        .with(Attribute::Citizenship, "Citizen")
        .with(Attribute::Savings, 60_000i64)
        .with(Attribute::CashAdvances, "Rare")
        .with(Attribute::ProductType, "Standard")
        .with(Attribute::Education, "Graduate")
        .with(Attribute::Location, "Low-risk region")
        .with(Attribute::MaritalStatus, "Married")
}

/// A deterministic, varied individual cardholder.
pub fn individual(i: i64) -> Record {
    let employment = ["Full-Time", "Part-Time", "Unemployed", "Self-Employed"];
    let cash = ["Rare", "Occasional", "Frequent"];
    let product = ["Standard", "Gold"];
    let education = ["High School", "College", "Graduate"];
    let region = ["Low-risk region", "Moderate-risk region", "High-risk region"];
    let marital = ["Married", "Single"];
    let u = i as usize;

    let mut r = Record::new(i)
        .with(Attribute::EmploymentStatus, employment[u % 4])
        .with(Attribute::RepaymentHistory, 60 + (i * 3) % 40)
        .with(Attribute::Bankruptcies, if i % 7 == 0 { 1i64 } else { 0i64 })
        .with(Attribute::OpenCreditLines, i % 13)
        .with(Attribute::CardLimit, 1_000 + i * 500)
        .with(Attribute::Age, 19 + (i * 3) % 50)
        .with(Attribute::Citizenship, if i % 5 == 0 { "Non-Citizen" } else { "Citizen" })
        .with(Attribute::Savings, i * 4_000)
        .with(Attribute::CashAdvances, cash[u % 3])
        .with(Attribute::ProductType, product[u % 2])
        .with(Attribute::Education, education[u % 3])
        .with(Attribute::Location, region[u % 3])
        .with(Attribute::MaritalStatus, marital[u % 2])
        .with(Attribute::Name, format!("Cardholder {i}"));
    if i % 6 != 0 {
        r = r.with(Attribute::Income, 20_000 + i * 7_000);
    }
    r
}

pub fn individuals(n: i64) -> RecordBatch {
    RecordBatch::from_records("CustomerID", (0..n).map(individual).collect())
}

/// Corporate cardholders: no marital status column, and a product type the
/// individual book never carries.
pub fn companies(n: i64) -> RecordBatch {
    let records = (0..n)
        .map(|i| {
            Record::new(format!("E-{i:04}"))
                .with(Attribute::Income, 150_000 + i * 25_000)
                .with(Attribute::EmploymentStatus, "Full-Time")
                .with(Attribute::RepaymentHistory, 80 + i % 20)
                .with(Attribute::Bankruptcies, 0i64)
                .with(Attribute::OpenCreditLines, 4 + i % 8)
                .with(Attribute::CardLimit, 50_000i64)
                .with(Attribute::Age, 5 + i % 30)
                .with(Attribute::Citizenship, "Citizen")
                .with(Attribute::Savings, 200_000i64)
                .with(Attribute::CashAdvances, "Rare")
                .with(Attribute::ProductType, if i % 2 == 0 { "Platinum" } else { "Gold" })
                .with(Attribute::Education, "Graduate")
                .with(Attribute::Location, "Moderate-risk region")
        })
        .collect();
    RecordBatch::from_records("EntityID", records)
}

pub fn small_forest() -> ForestConfig {
    ForestConfig {
        n_estimators: 12,
        ..ForestConfig::default()
    }
}

pub fn test_config(model_path: &Path) -> PipelineConfig {
    PipelineConfig {
        db_path: ":memory:".into(),
        model_path: model_path.to_string_lossy().into_owned(),
        tables: vec![TableConfig::individuals(), TableConfig::companies()],
        forest: small_forest(),
        ..PipelineConfig::default()
    }
}
