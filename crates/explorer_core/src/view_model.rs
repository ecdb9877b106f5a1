use crate::filter::FilterReport;
use crate::stats::{percent_overlap, probability_of_superiority, round, u3};
use crate::{PooledEffect, SessionState};

/// Digits shown for Cohen's d and its interval.
pub const EFFECT_DIGITS: u32 = 2;
/// Digits shown for percentages.
pub const PERCENT_DIGITS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub status: String,
    pub submission_enabled: bool,
    pub has_run_once: bool,
    pub corpus_size: usize,
    pub subset_size: usize,
    pub effect: Option<EffectView>,
    pub error: Option<String>,
    pub filter_report: Option<FilterReport>,
    pub dropped_submissions: usize,
    pub dirty: bool,
}

/// Pooled effect with its derived interpretability statistics, rounded for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectView {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub superiority_percent: f64,
    pub overlap_percent: f64,
    pub u3_percent: f64,
}

impl EffectView {
    pub fn from_pooled(effect: &PooledEffect) -> Self {
        let d = effect.value();
        Self {
            value: round(d, EFFECT_DIGITS),
            lower: round(effect.lower(), EFFECT_DIGITS),
            upper: round(effect.upper(), EFFECT_DIGITS),
            superiority_percent: round(probability_of_superiority(d) * 100.0, PERCENT_DIGITS),
            overlap_percent: round(percent_overlap(d) * 100.0, PERCENT_DIGITS),
            u3_percent: round(u3(d) * 100.0, PERCENT_DIGITS),
        }
    }

    pub fn interval_label(&self) -> String {
        format!("95% CI [{}, {}]", self.lower, self.upper)
    }
}
