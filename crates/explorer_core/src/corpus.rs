use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::engine_info;
use serde_json::Value;
use thiserror::Error;

use crate::EffectRecord;

#[derive(Debug, Error)]
pub enum CorpusLoadError {
    #[error("failed to read snapshot {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot must be an array of objects")]
    NotAnArray,
    #[error("record {index} is not an object")]
    NotAnObject { index: usize },
    #[error("record {index} is malformed: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("record {index} (study {study_id}) has invalid variance {variance}")]
    InvalidVariance {
        index: usize,
        study_id: String,
        variance: f64,
    },
}

/// Immutable, ordered set of effect records shared across the application.
///
/// Cloning is cheap; all clones see the same records.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    records: Arc<[EffectRecord]>,
}

impl Corpus {
    /// Validates and wraps already-parsed records.
    pub fn from_records(records: Vec<EffectRecord>) -> Result<Self, CorpusLoadError> {
        for (index, record) in records.iter().enumerate() {
            check_variance(index, record)?;
        }
        Ok(Self {
            records: records.into(),
        })
    }

    /// Parses a JSON snapshot: an array of flat record objects.
    pub fn from_json_str(json: &str) -> Result<Self, CorpusLoadError> {
        let document: Value = serde_json::from_str(json)?;
        let Value::Array(items) = document else {
            return Err(CorpusLoadError::NotAnArray);
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Err(CorpusLoadError::NotAnObject { index });
            }
            let record: EffectRecord = serde_json::from_value(item)
                .map_err(|source| CorpusLoadError::MalformedRecord { index, source })?;
            records.push(record);
        }
        Self::from_records(records)
    }

    /// Reads and parses a snapshot file.
    pub fn load(path: &Path) -> Result<Self, CorpusLoadError> {
        let text = fs::read_to_string(path).map_err(|source| CorpusLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_json_str(&text)?;
        engine_info!("Loaded {} effect records from {:?}", corpus.len(), path);
        Ok(corpus)
    }

    pub fn records(&self) -> &[EffectRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EffectRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a EffectRecord;
    type IntoIter = std::slice::Iter<'a, EffectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn check_variance(index: usize, record: &EffectRecord) -> Result<(), CorpusLoadError> {
    let variance = record.effect_size_variance;
    if variance.is_finite() && variance >= 0.0 {
        Ok(())
    } else {
        Err(CorpusLoadError::InvalidVariance {
            index,
            study_id: record.study_id.clone(),
            variance,
        })
    }
}
