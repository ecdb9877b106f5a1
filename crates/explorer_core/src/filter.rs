//! Predicate composition over the record corpus.
//!
//! Stages are conjunctive; inside a stage any selected option may match.
//! Option comparison is case-insensitive throughout.

use std::fmt;

use engine_logging::engine_debug;
use thiserror::Error;

use crate::{Corpus, CriteriaSet, EffectRecord};

/// One conjunct of the composed predicate, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Outcome,
    Measurement,
    CellSize,
    Aspect,
    Medium,
    Appeal,
    Country,
}

impl FilterStage {
    pub const ORDER: [FilterStage; 7] = [
        FilterStage::Outcome,
        FilterStage::Measurement,
        FilterStage::CellSize,
        FilterStage::Aspect,
        FilterStage::Medium,
        FilterStage::Appeal,
        FilterStage::Country,
    ];
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterStage::Outcome => "outcome",
            FilterStage::Measurement => "measurement",
            FilterStage::CellSize => "cell size",
            FilterStage::Aspect => "aspect",
            FilterStage::Medium => "medium",
            FilterStage::Appeal => "appeal",
            FilterStage::Country => "country",
        };
        f.write_str(name)
    }
}

/// How many records each stage removed, attributed to the first stage that rejected them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterReport {
    pub considered: usize,
    pub kept: usize,
    pub removed: Vec<(FilterStage, usize)>,
}

impl FilterReport {
    pub fn removed_by(&self, stage: FilterStage) -> usize {
        self.removed
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no records match the selected criteria")]
pub struct EmptyResultError {
    pub report: FilterReport,
}

/// Non-empty result of a filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSubset<'a> {
    pub records: Vec<&'a EffectRecord>,
    pub report: FilterReport,
}

/// Applies `criteria` to `corpus`, keeping corpus order.
///
/// An empty subset is reported as [`EmptyResultError`] so callers never try to
/// pool zero records.
pub fn filter<'a>(
    corpus: &'a Corpus,
    criteria: &CriteriaSet,
) -> Result<FilteredSubset<'a>, EmptyResultError> {
    let (records, report) = filter_with_report(corpus, criteria);
    if records.is_empty() {
        return Err(EmptyResultError { report });
    }
    Ok(FilteredSubset { records, report })
}

pub fn filter_with_report<'a>(
    corpus: &'a Corpus,
    criteria: &CriteriaSet,
) -> (Vec<&'a EffectRecord>, FilterReport) {
    let compiled = CompiledCriteria::new(criteria);
    let mut removed = [0usize; FilterStage::ORDER.len()];
    let mut subset = Vec::new();

    for record in corpus {
        match FilterStage::ORDER
            .iter()
            .position(|stage| !compiled.admits(*stage, record))
        {
            Some(idx) => removed[idx] += 1,
            None => subset.push(record),
        }
    }

    let report = FilterReport {
        considered: corpus.len(),
        kept: subset.len(),
        removed: FilterStage::ORDER.into_iter().zip(removed).collect(),
    };
    for (stage, count) in &report.removed {
        engine_debug!("filter stage {} removed {} records", stage, count);
    }
    engine_debug!("filter kept {} of {} records", report.kept, report.considered);
    (subset, report)
}

/// The composed predicate for a single record.
pub fn matches(record: &EffectRecord, criteria: &CriteriaSet) -> bool {
    let compiled = CompiledCriteria::new(criteria);
    FilterStage::ORDER
        .iter()
        .all(|stage| compiled.admits(*stage, record))
}

/// Criteria with every option lower-cased once per filter run.
struct CompiledCriteria {
    outcomes: Vec<String>,
    measurements: Vec<String>,
    aspects: Vec<String>,
    mediums: Vec<String>,
    appeals: Vec<String>,
    countries: Vec<String>,
    minimum_cell_size: u32,
}

impl CompiledCriteria {
    fn new(criteria: &CriteriaSet) -> Self {
        let lower = |set: &std::collections::BTreeSet<String>| {
            set.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>()
        };
        Self {
            outcomes: lower(&criteria.outcomes),
            measurements: lower(&criteria.measurements),
            aspects: lower(&criteria.aspects),
            mediums: lower(&criteria.mediums),
            appeals: lower(&criteria.appeals),
            countries: lower(&criteria.countries),
            minimum_cell_size: criteria.minimum_cell_size,
        }
    }

    fn admits(&self, stage: FilterStage, record: &EffectRecord) -> bool {
        match stage {
            FilterStage::Outcome => is_member(&self.outcomes, &record.outcome_subcategory),
            FilterStage::Measurement => contains_any(&self.measurements, &record.measurement_type),
            FilterStage::CellSize => {
                record.control_n > self.minimum_cell_size
                    && record.intervention_n > self.minimum_cell_size
            }
            FilterStage::Aspect => unclassified_or_any(&self.aspects, &record.intervention_aspect),
            FilterStage::Medium => unclassified_or_any(&self.mediums, &record.intervention_medium),
            FilterStage::Appeal => unclassified_or_any(&self.appeals, &record.intervention_appeal),
            FilterStage::Country => {
                is_member(&self.countries, &record.sample_country_control)
                    && is_member(&self.countries, &record.sample_country_intervention)
            }
        }
    }
}

fn is_member(selected: &[String], value: &str) -> bool {
    let value = value.to_lowercase();
    selected.iter().any(|option| *option == value)
}

fn contains_any(selected: &[String], value: &str) -> bool {
    let value = value.to_lowercase();
    selected.iter().any(|option| value.contains(option.as_str()))
}

// Empty facet values are unclassified and always pass.
fn unclassified_or_any(selected: &[String], value: &str) -> bool {
    value.is_empty() || contains_any(selected, value)
}
