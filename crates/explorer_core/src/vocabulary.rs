use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CriteriaSet, Facet};

/// Named group of outcome options (behaviors, intentions, attitudes).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    pub options: Vec<String>,
}

/// Closed option lists for every facet, supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub outcome_groups: Vec<OptionGroup>,
    pub measurements: Vec<String>,
    pub aspects: Vec<String>,
    pub mediums: Vec<String>,
    pub appeals: Vec<String>,
    pub countries: Vec<String>,
}

/// Selectable option as offered to a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOption {
    /// Lower-cased label; what gets stored in a [`CriteriaSet`].
    pub id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    #[error("{option:?} is not a known {facet} option")]
    UnknownOption { facet: Facet, option: String },
}

impl Vocabulary {
    /// Option labels for a facet, outcome groups flattened in order.
    pub fn labels(&self, facet: Facet) -> Vec<&str> {
        match facet {
            Facet::Outcome => self
                .outcome_groups
                .iter()
                .flat_map(|group| group.options.iter().map(String::as_str))
                .collect(),
            Facet::Measurement => self.measurements.iter().map(String::as_str).collect(),
            Facet::Aspect => self.aspects.iter().map(String::as_str).collect(),
            Facet::Medium => self.mediums.iter().map(String::as_str).collect(),
            Facet::Appeal => self.appeals.iter().map(String::as_str).collect(),
            Facet::Country => self.countries.iter().map(String::as_str).collect(),
        }
    }

    /// Every option id of a facet; used to default a facet to "everything".
    pub fn all_ids(&self, facet: Facet) -> BTreeSet<String> {
        self.labels(facet)
            .into_iter()
            .map(str::to_lowercase)
            .collect()
    }

    pub fn select_options(&self, facet: Facet, selected: &BTreeSet<String>) -> Vec<FacetOption> {
        self.labels(facet)
            .into_iter()
            .map(|label| {
                let id = label.to_lowercase();
                let checked = selected.iter().any(|s| s.to_lowercase() == id);
                FacetOption {
                    id,
                    label: label.to_string(),
                    checked,
                }
            })
            .collect()
    }

    /// Rejects selections that name options outside the vocabulary.
    pub fn check(&self, criteria: &CriteriaSet) -> Result<(), VocabularyError> {
        for facet in Facet::ALL {
            let known = self.all_ids(facet);
            for option in criteria.selections(facet) {
                if !known.contains(&option.to_lowercase()) {
                    return Err(VocabularyError::UnknownOption {
                        facet,
                        option: option.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
