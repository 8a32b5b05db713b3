//! Strongly-typed cardholder records.
//!
//! RULE: The store converts rows into `Record`s at the read boundary.
//! Nothing past that boundary looks columns up by string name, except
//! pass-through columns carried in `Record::extra`.

use crate::{risk_tier::RiskTier, types::AttrValue};

pub const CRR_SCORE_COLUMN: &str = "CRR_Score";
pub const RISK_CATEGORY_COLUMN: &str = "RiskCategory";
pub const ML_PRED_COLUMN: &str = "ML_CRR_Pred";
pub const HYBRID_CRR_COLUMN: &str = "Hybrid_CRR";
pub const HYBRID_RISK_COLUMN: &str = "Hybrid_Risk";

/// Derived columns, in the order they are written back.
pub const DERIVED_COLUMNS: [&str; 5] = [
    CRR_SCORE_COLUMN,
    RISK_CATEGORY_COLUMN,
    ML_PRED_COLUMN,
    HYBRID_CRR_COLUMN,
    HYBRID_RISK_COLUMN,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Numeric,
    Categorical,
    /// Scored, never used as a model feature.
    Identity,
}

/// The raw attributes a cardholder may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Income,
    EmploymentStatus,
    RepaymentHistory,
    Bankruptcies,
    OpenCreditLines,
    CardLimit,
    Age,
    Citizenship,
    Savings,
    CashAdvances,
    ProductType,
    Education,
    Location,
    MaritalStatus,
    Name,
}

impl Attribute {
    /// Schema order. Feature columns follow this order.
    pub const ALL: [Attribute; 15] = [
        Self::Income,
        Self::EmploymentStatus,
        Self::RepaymentHistory,
        Self::Bankruptcies,
        Self::OpenCreditLines,
        Self::CardLimit,
        Self::Age,
        Self::Citizenship,
        Self::Savings,
        Self::CashAdvances,
        Self::ProductType,
        Self::Education,
        Self::Location,
        Self::MaritalStatus,
        Self::Name,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::EmploymentStatus => "EmploymentStatus",
            Self::RepaymentHistory => "RepaymentHistory",
            Self::Bankruptcies => "Bankruptcies",
            Self::OpenCreditLines => "OpenCreditLines",
            Self::CardLimit => "CardLimit",
            Self::Age => "Age",
            Self::Citizenship => "Citizenship",
            Self::Savings => "Savings",
            Self::CashAdvances => "CashAdvances",
            Self::ProductType => "ProductType",
            Self::Education => "Education",
            Self::Location => "Location",
            Self::MaritalStatus => "MaritalStatus",
            Self::Name => "Name",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.column() == name)
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Income
            | Self::RepaymentHistory
            | Self::Bankruptcies
            | Self::OpenCreditLines
            | Self::CardLimit
            | Self::Age
            | Self::Savings => AttributeKind::Numeric,
            Self::EmploymentStatus
            | Self::Citizenship
            | Self::CashAdvances
            | Self::ProductType
            | Self::Education
            | Self::Location
            | Self::MaritalStatus => AttributeKind::Categorical,
            Self::Name => AttributeKind::Identity,
        }
    }

    /// SQLite column affinity used when the table is rewritten.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Income | Self::RepaymentHistory | Self::Savings => "REAL",
            Self::Bankruptcies | Self::OpenCreditLines | Self::CardLimit | Self::Age => "INTEGER",
            _ => "TEXT",
        }
    }
}

/// One cardholder, individual or corporate.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: AttrValue,

    pub income: Option<AttrValue>,
    pub employment_status: Option<AttrValue>,
    pub repayment_history: Option<AttrValue>,
    pub bankruptcies: Option<AttrValue>,
    pub open_credit_lines: Option<AttrValue>,
    pub card_limit: Option<AttrValue>,
    pub age: Option<AttrValue>,
    pub citizenship: Option<AttrValue>,
    pub savings: Option<AttrValue>,
    pub cash_advances: Option<AttrValue>,
    pub product_type: Option<AttrValue>,
    pub education: Option<AttrValue>,
    pub location: Option<AttrValue>,
    pub marital_status: Option<AttrValue>,
    pub name: Option<AttrValue>,

    // Derived
    pub crr_score: Option<i64>,
    pub risk_category: Option<RiskTier>,
    pub ml_crr_pred: Option<f64>,
    pub hybrid_crr: Option<f64>,
    pub hybrid_risk: Option<RiskTier>,

    /// Columns outside the schema, carried through unchanged.
    pub extra: Vec<(String, Option<AttrValue>)>,
}

impl Record {
    pub fn new(id: impl Into<AttrValue>) -> Self {
        Self {
            id: id.into(),
            income: None,
            employment_status: None,
            repayment_history: None,
            bankruptcies: None,
            open_credit_lines: None,
            card_limit: None,
            age: None,
            citizenship: None,
            savings: None,
            cash_advances: None,
            product_type: None,
            education: None,
            location: None,
            marital_status: None,
            name: None,
            crr_score: None,
            risk_category: None,
            ml_crr_pred: None,
            hybrid_crr: None,
            hybrid_risk: None,
            extra: Vec::new(),
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, attr: Attribute, value: impl Into<AttrValue>) -> Self {
        self.set(attr, Some(value.into()));
        self
    }

    pub fn get(&self, attr: Attribute) -> Option<&AttrValue> {
        self.slot(attr).as_ref()
    }

    pub fn set(&mut self, attr: Attribute, value: Option<AttrValue>) {
        *self.slot_mut(attr) = value;
    }

    fn slot(&self, attr: Attribute) -> &Option<AttrValue> {
        match attr {
            Attribute::Income => &self.income,
            Attribute::EmploymentStatus => &self.employment_status,
            Attribute::RepaymentHistory => &self.repayment_history,
            Attribute::Bankruptcies => &self.bankruptcies,
            Attribute::OpenCreditLines => &self.open_credit_lines,
            Attribute::CardLimit => &self.card_limit,
            Attribute::Age => &self.age,
            Attribute::Citizenship => &self.citizenship,
            Attribute::Savings => &self.savings,
            Attribute::CashAdvances => &self.cash_advances,
            Attribute::ProductType => &self.product_type,
            Attribute::Education => &self.education,
            Attribute::Location => &self.location,
            Attribute::MaritalStatus => &self.marital_status,
            Attribute::Name => &self.name,
        }
    }

    fn slot_mut(&mut self, attr: Attribute) -> &mut Option<AttrValue> {
        match attr {
            Attribute::Income => &mut self.income,
            Attribute::EmploymentStatus => &mut self.employment_status,
            Attribute::RepaymentHistory => &mut self.repayment_history,
            Attribute::Bankruptcies => &mut self.bankruptcies,
            Attribute::OpenCreditLines => &mut self.open_credit_lines,
            Attribute::CardLimit => &mut self.card_limit,
            Attribute::Age => &mut self.age,
            Attribute::Citizenship => &mut self.citizenship,
            Attribute::Savings => &mut self.savings,
            Attribute::CashAdvances => &mut self.cash_advances,
            Attribute::ProductType => &mut self.product_type,
            Attribute::Education => &mut self.education,
            Attribute::Location => &mut self.location,
            Attribute::MaritalStatus => &mut self.marital_status,
            Attribute::Name => &mut self.name,
        }
    }
}

/// A batch of records loaded from one table.
///
/// `attributes` lists the schema attributes that exist as columns in the
/// source table. An attribute absent from the table is different from an
/// attribute that is present but null on every row: the first simply
/// contributes no features, the second cannot be imputed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub id_column: String,
    pub attributes: Vec<Attribute>,
    pub extra_columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(id_column: impl Into<String>, attributes: Vec<Attribute>, records: Vec<Record>) -> Self {
        let mut attributes = attributes;
        attributes.sort();
        attributes.dedup();
        Self {
            id_column: id_column.into(),
            attributes,
            extra_columns: Vec::new(),
            records,
        }
    }

    /// Build a batch whose present attributes are those set on at least
    /// one record.
    pub fn from_records(id_column: impl Into<String>, records: Vec<Record>) -> Self {
        let attributes = Attribute::ALL
            .into_iter()
            .filter(|a| records.iter().any(|r| r.get(*a).is_some()))
            .collect();
        Self::new(id_column, attributes, records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_attribute(&self, attr: Attribute) -> bool {
        self.attributes.contains(&attr)
    }

    pub fn ids(&self) -> Vec<AttrValue> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }
}
