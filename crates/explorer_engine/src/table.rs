use explorer_core::EffectRecord;
use serde::Serialize;
use thiserror::Error;

/// Column names the pooling model reads, in table order.
pub const COLUMNS: [&str; 6] = [
    "effect_size_value",
    "effect_size_var",
    "paper_study",
    "outcome",
    "group_1",
    "group_2",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    #[error("no rows to pool")]
    Empty,
    #[error("row {row} has non-finite effect size {value}")]
    NonFiniteEffect { row: usize, value: f64 },
    #[error("row {row} has invalid variance {value}")]
    InvalidVariance { row: usize, value: f64 },
    #[error("row {row} has an empty {column}")]
    EmptyKey { row: usize, column: &'static str },
}

/// Column-oriented input for the pooling model.
///
/// Serializes as a JSON object with one array per column, named as in
/// [`COLUMNS`]. Every column has the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PoolingTable {
    pub effect_size_value: Vec<f64>,
    pub effect_size_var: Vec<f64>,
    pub paper_study: Vec<String>,
    pub outcome: Vec<String>,
    pub group_1: Vec<String>,
    pub group_2: Vec<String>,
}

impl PoolingTable {
    /// Builds the table, rejecting the first row that does not fit the schema.
    pub fn from_records(records: &[EffectRecord]) -> Result<Self, MarshalError> {
        if records.is_empty() {
            return Err(MarshalError::Empty);
        }

        let mut table = Self::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            check_row(row, record)?;
            table.effect_size_value.push(record.effect_size_value);
            table.effect_size_var.push(record.effect_size_variance);
            table.paper_study.push(record.study_id.clone());
            table.outcome.push(record.outcome_key.clone());
            table.group_1.push(record.group1.clone());
            table.group_2.push(record.group2.clone());
        }
        Ok(table)
    }

    fn with_capacity(rows: usize) -> Self {
        Self {
            effect_size_value: Vec::with_capacity(rows),
            effect_size_var: Vec::with_capacity(rows),
            paper_study: Vec::with_capacity(rows),
            outcome: Vec::with_capacity(rows),
            group_1: Vec::with_capacity(rows),
            group_2: Vec::with_capacity(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.effect_size_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effect_size_value.is_empty()
    }

    /// Number of distinct study clusters.
    pub fn study_count(&self) -> usize {
        let mut studies: Vec<&str> = self.paper_study.iter().map(String::as_str).collect();
        studies.sort_unstable();
        studies.dedup();
        studies.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn check_row(row: usize, record: &EffectRecord) -> Result<(), MarshalError> {
    if !record.effect_size_value.is_finite() {
        return Err(MarshalError::NonFiniteEffect {
            row,
            value: record.effect_size_value,
        });
    }
    let variance = record.effect_size_variance;
    if !variance.is_finite() || variance < 0.0 {
        return Err(MarshalError::InvalidVariance {
            row,
            value: variance,
        });
    }
    if record.study_id.is_empty() {
        return Err(MarshalError::EmptyKey {
            row,
            column: "paper_study",
        });
    }
    if record.outcome_key.is_empty() {
        return Err(MarshalError::EmptyKey {
            row,
            column: "outcome",
        });
    }
    Ok(())
}
