use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrrError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    #[error("Table '{table}' has no identifier column '{column}'")]
    IdentifierColumnMissing { table: String, column: String },

    #[error("Table '{table}' row {row} has a null identifier")]
    NullIdentifier { table: String, row: usize },

    #[error("Schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    #[error("Cannot impute column '{column}': no observed values")]
    ImputationUndefined { column: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Cannot train on {rows} row(s)")]
    InsufficientData { rows: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CrrError {
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::SchemaMismatch { reason: reason.into() }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }
}

pub type CrrResult<T> = Result<T, CrrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imputation_error_names_the_column() {
        let err = CrrError::ImputationUndefined { column: "Savings".into() };
        assert_eq!(err.to_string(), "Cannot impute column 'Savings': no observed values");
    }

    #[test]
    fn schema_helper_builds_mismatch() {
        let err = CrrError::schema("manifest is empty");
        assert!(matches!(err, CrrError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("manifest is empty"));
    }
}
