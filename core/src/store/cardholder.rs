use super::{quote_ident, CardholderStore};
use crate::{
    config::TableConfig,
    error::{CrrError, CrrResult},
    record::{
        Attribute, Record, RecordBatch, CRR_SCORE_COLUMN, HYBRID_CRR_COLUMN, HYBRID_RISK_COLUMN,
        ML_PRED_COLUMN, RISK_CATEGORY_COLUMN,
    },
    risk_tier::RiskTier,
    types::AttrValue,
};
use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derived {
    CrrScore,
    RiskCategory,
    MlPred,
    HybridCrr,
    HybridRisk,
}

impl Derived {
    const ALL: [Derived; 5] = [
        Self::CrrScore,
        Self::RiskCategory,
        Self::MlPred,
        Self::HybridCrr,
        Self::HybridRisk,
    ];

    fn column(&self) -> &'static str {
        match self {
            Self::CrrScore => CRR_SCORE_COLUMN,
            Self::RiskCategory => RISK_CATEGORY_COLUMN,
            Self::MlPred => ML_PRED_COLUMN,
            Self::HybridCrr => HYBRID_CRR_COLUMN,
            Self::HybridRisk => HYBRID_RISK_COLUMN,
        }
    }

    fn sql_type(&self) -> &'static str {
        match self {
            Self::CrrScore => "INTEGER",
            Self::MlPred | Self::HybridCrr => "REAL",
            Self::RiskCategory | Self::HybridRisk => "TEXT",
        }
    }

    fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.column() == name)
    }

    fn is_set(&self, r: &Record) -> bool {
        match self {
            Self::CrrScore => r.crr_score.is_some(),
            Self::RiskCategory => r.risk_category.is_some(),
            Self::MlPred => r.ml_crr_pred.is_some(),
            Self::HybridCrr => r.hybrid_crr.is_some(),
            Self::HybridRisk => r.hybrid_risk.is_some(),
        }
    }

    fn read_into(&self, r: &mut Record, v: Option<AttrValue>) {
        match self {
            Self::CrrScore => r.crr_score = v.and_then(|v| v.as_i64()),
            Self::RiskCategory => r.risk_category = v.and_then(|v| RiskTier::parse(&v.to_string())),
            Self::MlPred => r.ml_crr_pred = v.and_then(|v| v.as_f64()),
            Self::HybridCrr => r.hybrid_crr = v.and_then(|v| v.as_f64()),
            Self::HybridRisk => r.hybrid_risk = v.and_then(|v| RiskTier::parse(&v.to_string())),
        }
    }

    fn write_from(&self, r: &Record) -> Value {
        match self {
            Self::CrrScore => r.crr_score.map_or(Value::Null, Value::Integer),
            Self::RiskCategory => tier_value(r.risk_category),
            Self::MlPred => r.ml_crr_pred.map_or(Value::Null, Value::Real),
            Self::HybridCrr => r.hybrid_crr.map_or(Value::Null, Value::Real),
            Self::HybridRisk => tier_value(r.hybrid_risk),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Id,
    Attr(Attribute),
    Derived(Derived),
    Extra,
}

fn tier_value(tier: Option<RiskTier>) -> Value {
    tier.map_or(Value::Null, |t| Value::Text(t.label().to_string()))
}

fn from_sql(v: Value) -> Option<AttrValue> {
    match v {
        Value::Null => None,
        Value::Integer(i) => Some(AttrValue::Integer(i)),
        Value::Real(r) => Some(AttrValue::Real(r)),
        Value::Text(s) => Some(AttrValue::Text(s)),
        Value::Blob(b) => Some(AttrValue::Text(String::from_utf8_lossy(&b).into_owned())),
    }
}

fn to_sql(v: Option<&AttrValue>) -> Value {
    match v {
        None => Value::Null,
        Some(AttrValue::Integer(i)) => Value::Integer(*i),
        Some(AttrValue::Real(r)) => Value::Real(*r),
        Some(AttrValue::Text(s)) => Value::Text(s.clone()),
    }
}

impl CardholderStore {
    // ── Cardholder tables ─────────────────────────────────────────

    /// Read a whole table, validating each row into a `Record`.
    pub fn read_table(&self, table: &TableConfig) -> CrrResult<RecordBatch> {
        if !self.table_exists(&table.name)? {
            return Err(CrrError::TableNotFound { table: table.name.clone() });
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(&table.name)))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let slots: Vec<Slot> = columns
            .iter()
            .map(|c| {
                if *c == table.id_column {
                    Slot::Id
                } else if let Some(a) = Attribute::from_column(c) {
                    Slot::Attr(a)
                } else if let Some(d) = Derived::from_column(c) {
                    Slot::Derived(d)
                } else {
                    Slot::Extra
                }
            })
            .collect();
        let id_idx = slots
            .iter()
            .position(|s| matches!(s, Slot::Id))
            .ok_or_else(|| CrrError::IdentifierColumnMissing {
                table: table.name.clone(),
                column: table.id_column.clone(),
            })?;

        let n_cols = columns.len();
        let raw_rows = stmt
            .query_map([], |row| {
                (0..n_cols)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(raw_rows.len());
        for (row_no, mut values) in raw_rows.into_iter().enumerate() {
            let id = from_sql(std::mem::replace(&mut values[id_idx], Value::Null)).ok_or_else(|| {
                CrrError::NullIdentifier {
                    table: table.name.clone(),
                    row: row_no,
                }
            })?;
            let mut record = Record::new(id);
            for ((value, slot), column) in values.into_iter().zip(&slots).zip(&columns) {
                let value = from_sql(value);
                match slot {
                    Slot::Id => {}
                    Slot::Attr(a) => record.set(*a, value),
                    Slot::Derived(d) => d.read_into(&mut record, value),
                    Slot::Extra => record.extra.push((column.clone(), value)),
                }
            }
            records.push(record);
        }

        let attributes = slots
            .iter()
            .filter_map(|s| match s {
                Slot::Attr(a) => Some(*a),
                _ => None,
            })
            .collect();
        let extra_columns = columns
            .iter()
            .zip(&slots)
            .filter(|(_, s)| matches!(s, Slot::Extra))
            .map(|(c, _)| c.clone())
            .collect();

        let mut batch = RecordBatch::new(table.id_column.clone(), attributes, records);
        batch.extra_columns = extra_columns;
        log::debug!("read {} rows from '{}'", batch.len(), table.name);
        Ok(batch)
    }

    /// Destructively replace `table` with `batch`, in one transaction.
    ///
    /// Columns: identifier, present attributes, pass-through columns, then
    /// every derived column set on at least one record.
    pub fn replace_table(&self, table: &TableConfig, batch: &RecordBatch) -> CrrResult<()> {
        if batch.id_column != table.id_column {
            return Err(CrrError::schema(format!(
                "batch identifier '{}' does not match table identifier '{}'",
                batch.id_column, table.id_column
            )));
        }

        let mut layout: Vec<(String, &'static str, Slot)> = vec![(table.id_column.clone(), "", Slot::Id)];
        layout.extend(
            batch
                .attributes
                .iter()
                .map(|a| (a.column().to_string(), a.sql_type(), Slot::Attr(*a))),
        );
        layout.extend(batch.extra_columns.iter().map(|c| (c.clone(), "", Slot::Extra)));
        layout.extend(
            Derived::ALL
                .into_iter()
                .filter(|d| batch.records.iter().any(|r| d.is_set(r)))
                .map(|d| (d.column().to_string(), d.sql_type(), Slot::Derived(d))),
        );

        let table_ident = quote_ident(&table.name);
        let defs = layout
            .iter()
            .map(|(name, ty, _)| format!("{} {ty}", quote_ident(name)).trim_end().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let names = layout
            .iter()
            .map(|(name, _, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=layout.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table_ident};"))?;
        tx.execute_batch(&format!("CREATE TABLE {table_ident} ({defs});"))?;
        {
            let mut insert =
                tx.prepare(&format!("INSERT INTO {table_ident} ({names}) VALUES ({placeholders})"))?;
            for record in &batch.records {
                let values: Vec<Value> = layout
                    .iter()
                    .map(|(name, _, slot)| match slot {
                        Slot::Id => to_sql(Some(&record.id)),
                        Slot::Attr(a) => to_sql(record.get(*a)),
                        Slot::Derived(d) => d.write_from(record),
                        Slot::Extra => to_sql(
                            record
                                .extra
                                .iter()
                                .find(|(c, _)| c == name)
                                .and_then(|(_, v)| v.as_ref()),
                        ),
                    })
                    .collect();
                insert.execute(rusqlite::params_from_iter(values))?;
            }
        }
        tx.commit()?;

        log::info!("Updated '{}' with {} rows", table.name, batch.len());
        Ok(())
    }
}
