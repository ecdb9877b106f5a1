use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A multi-select facet of the inclusion criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Outcome,
    Measurement,
    Aspect,
    Medium,
    Appeal,
    Country,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Outcome,
        Facet::Measurement,
        Facet::Aspect,
        Facet::Medium,
        Facet::Appeal,
        Facet::Country,
    ];

    /// Noun used in user-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            Facet::Outcome => "outcome",
            Facet::Measurement => "outcome measurement",
            Facet::Aspect => "intervention aspect",
            Facet::Medium => "intervention medium",
            Facet::Appeal => "intervention appeal",
            Facet::Country => "country",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("Must select at least one {0}.")]
    EmptyFacet(Facet),
    #[error("Minimum cell size must be at least 1 (got {0}).")]
    MinimumCellSize(u32),
}

/// Current filter selection: one option set per facet plus a cell-size floor.
///
/// A set with no selections is invalid rather than "match nothing"; see
/// [`CriteriaSet::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaSet {
    pub outcomes: BTreeSet<String>,
    pub measurements: BTreeSet<String>,
    pub aspects: BTreeSet<String>,
    pub mediums: BTreeSet<String>,
    pub appeals: BTreeSet<String>,
    pub countries: BTreeSet<String>,
    pub minimum_cell_size: u32,
}

impl Default for CriteriaSet {
    fn default() -> Self {
        Self {
            outcomes: BTreeSet::new(),
            measurements: BTreeSet::new(),
            aspects: BTreeSet::new(),
            mediums: BTreeSet::new(),
            appeals: BTreeSet::new(),
            countries: BTreeSet::new(),
            minimum_cell_size: 1,
        }
    }
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selections(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::Outcome => &self.outcomes,
            Facet::Measurement => &self.measurements,
            Facet::Aspect => &self.aspects,
            Facet::Medium => &self.mediums,
            Facet::Appeal => &self.appeals,
            Facet::Country => &self.countries,
        }
    }

    pub fn selections_mut(&mut self, facet: Facet) -> &mut BTreeSet<String> {
        match facet {
            Facet::Outcome => &mut self.outcomes,
            Facet::Measurement => &mut self.measurements,
            Facet::Aspect => &mut self.aspects,
            Facet::Medium => &mut self.mediums,
            Facet::Appeal => &mut self.appeals,
            Facet::Country => &mut self.countries,
        }
    }

    /// Replaces the selections of one facet.
    pub fn with<I, S>(mut self, facet: Facet, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.selections_mut(facet) = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_minimum_cell_size(mut self, minimum_cell_size: u32) -> Self {
        self.minimum_cell_size = minimum_cell_size;
        self
    }

    /// Checks the invariants every submitted selection must hold.
    ///
    /// Facets are checked in [`Facet::ALL`] order and the first violation wins.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if let Some(facet) = Facet::ALL
            .into_iter()
            .find(|facet| self.selections(*facet).is_empty())
        {
            return Err(CriteriaError::EmptyFacet(facet));
        }
        if self.minimum_cell_size < 1 {
            return Err(CriteriaError::MinimumCellSize(self.minimum_cell_size));
        }
        Ok(())
    }
}
