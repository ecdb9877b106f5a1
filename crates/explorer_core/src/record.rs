use serde::{Deserialize, Serialize};

/// One reported effect from a source study.
///
/// Field names on the wire are the camelCase spelling of the Rust names
/// (`studyId`, `effectSizeVariance`, ...). Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectRecord {
    /// Clustering key; records sharing a study are statistically dependent.
    pub study_id: String,
    /// Subgroup key within a study.
    pub outcome_key: String,
    pub outcome_subcategory: String,
    /// May list several measurement types in one string.
    pub measurement_type: String,
    /// Empty means unclassified.
    pub intervention_aspect: String,
    /// Empty means unclassified.
    pub intervention_medium: String,
    /// Empty means unclassified.
    pub intervention_appeal: String,
    pub sample_country_control: String,
    pub sample_country_intervention: String,
    pub control_n: u32,
    pub intervention_n: u32,
    /// Standardized mean difference.
    pub effect_size_value: f64,
    /// Sampling variance of `effect_size_value`; never negative.
    pub effect_size_variance: f64,
    pub group1: String,
    pub group2: String,
}

/// Pooled estimate with its confidence interval.
///
/// Construction goes through [`PooledEffect::new`], which enforces
/// `lower <= value <= upper` over finite numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PooledEffect {
    value: f64,
    lower: f64,
    upper: f64,
}

impl PooledEffect {
    pub fn new(value: f64, lower: f64, upper: f64) -> Option<Self> {
        let finite = value.is_finite() && lower.is_finite() && upper.is_finite();
        if finite && lower <= value && value <= upper {
            Some(Self {
                value,
                lower,
                upper,
            })
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}
