//! Shared primitive types used across the scoring pipeline.

use std::fmt;

/// Name of a stored table.
pub type TableName = String;

/// Name of a column, either in the store or in a feature table.
pub type ColumnName = String;

/// A raw cell value as read from the store.
///
/// Scorers coerce these themselves; a value that cannot be coerced is a
/// parse failure local to the scorer, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl AttrValue {
    /// Float coercion. Text is trimmed and parsed; non-finite results fail.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Self::Integer(i) => *i as f64,
            Self::Real(r) => *r,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Integer coercion. Reals truncate toward zero; text must be an
    /// integer literal ("12.5" fails).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Real(r) if r.is_finite() && r.abs() < i64::MAX as f64 => Some(r.trunc() as i64),
            Self::Real(_) => None,
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Lower-cased display form, used by the text-matching scorers.
    pub fn lowercase(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
