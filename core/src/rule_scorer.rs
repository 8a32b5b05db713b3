//! Composite rule scorer.
//!
//! Sums the attribute scorers into three signal tiers:
//!   - primary:   income, employment, repayment, bankruptcies, open lines,
//!                card limit, age, citizenship
//!   - secondary: savings, cash advances, product type, education, region
//!   - tertiary:  marital status, identity verification
//!
//! Pure function of one record. The cached `CRR_Score` column must always
//! equal what `rule_score` returns for the same raw attributes.

use crate::{
    attribute_scorers::*,
    record::{Attribute, Record, RecordBatch},
    risk_tier::RiskTier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleScore {
    pub primary: u32,
    pub secondary: u32,
    pub tertiary: u32,
}

impl RuleScore {
    pub fn total(&self) -> u32 {
        self.primary + self.secondary + self.tertiary
    }

    pub fn tier(&self) -> RiskTier {
        RiskTier::from_score(self.total() as f64)
    }
}

pub fn rule_score(record: &Record) -> RuleScore {
    let a = |attr| record.get(attr);

    let primary = score_income(a(Attribute::Income))
        + score_employment(a(Attribute::EmploymentStatus))
        + score_repayment(a(Attribute::RepaymentHistory))
        + score_bankruptcies(a(Attribute::Bankruptcies))
        + score_open_lines(a(Attribute::OpenCreditLines))
        + score_card_limit(a(Attribute::CardLimit))
        + score_age(a(Attribute::Age))
        + score_citizenship(a(Attribute::Citizenship));

    let secondary = score_savings(a(Attribute::Savings))
        + score_cash_advances(a(Attribute::CashAdvances))
        + score_product_type(a(Attribute::ProductType))
        + score_education(a(Attribute::Education))
        + score_region(a(Attribute::Location));

    let tertiary = score_marital(a(Attribute::MaritalStatus))
        + score_identity_verified(a(Attribute::Name));

    RuleScore { primary, secondary, tertiary }
}

/// Composite `CRR_Score` for one record.
pub fn crr_score(record: &Record) -> i64 {
    rule_score(record).total() as i64
}

/// Back-fill `CRR_Score` and `RiskCategory` on every record.
///
/// A cached score that disagrees with the raw attributes is replaced and
/// logged. Returns the number of records whose cached score had drifted.
pub fn apply_rule_scores(batch: &mut RecordBatch) -> usize {
    let mut drifted = 0;
    for record in &mut batch.records {
        let score = crr_score(record);
        if let Some(cached) = record.crr_score {
            if cached != score {
                log::warn!(
                    "rule score drift for {}={}: cached {cached}, recomputed {score}",
                    batch.id_column,
                    record.id
                );
                drifted += 1;
            }
        }
        record.crr_score = Some(score);
        record.risk_category = Some(RiskTier::from_score(score as f64));
    }
    drifted
}
