use std::fmt;

use thiserror::Error;

use crate::filter::FilterReport;
use crate::view_model::{AppViewModel, EffectView};
use crate::{Corpus, CriteriaError, CriteriaSet, EffectRecord, PooledEffect};

pub type RequestId = u64;

/// Lifecycle of the statistical engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Provisioning,
    Ready,
    Busy,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Provisioning => "provisioning",
            SessionState::Ready => "ready",
            SessionState::Busy => "busy",
        };
        f.write_str(name)
    }
}

/// Engine-side failure as seen by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFailure {
    #[error("engine is not ready")]
    NotReady,
    #[error("{0}")]
    Invocation(String),
}

/// Display-safe error condition shown next to the criteria.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("No papers match these criteria")]
    NoMatches,
    #[error("{0}")]
    InvalidCriteria(CriteriaError),
    #[error("The statistical engine is not ready yet")]
    EngineNotReady,
    #[error("Meta-analysis failed: {0}")]
    EngineFailed(String),
    #[error("Could not start the statistical engine: {0}")]
    ProvisioningFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    corpus: Corpus,
    criteria: CriteriaSet,
    session: SessionState,
    has_run_once: bool,
    submission_disabled: bool,
    in_flight: Option<RequestId>,
    next_request_id: RequestId,
    subset: Vec<EffectRecord>,
    filter_report: Option<FilterReport>,
    pooled: Option<PooledEffect>,
    error: Option<DisplayError>,
    dropped_submissions: usize,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Corpus::default(), CriteriaSet::default())
    }
}

impl AppState {
    /// Fresh state with submission disabled until the engine reports ready.
    pub fn new(corpus: Corpus, criteria: CriteriaSet) -> Self {
        Self {
            corpus,
            criteria,
            session: SessionState::Uninitialized,
            has_run_once: false,
            submission_disabled: true,
            in_flight: None,
            next_request_id: 1,
            subset: Vec::new(),
            filter_report: None,
            pooled: None,
            error: None,
            dropped_submissions: 0,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            status: self.status_line().to_string(),
            submission_enabled: !self.submission_disabled,
            has_run_once: self.has_run_once,
            corpus_size: self.corpus.len(),
            subset_size: self.subset.len(),
            effect: self.pooled.as_ref().map(EffectView::from_pooled),
            error: self.error.as_ref().map(ToString::to_string),
            filter_report: self.filter_report.clone(),
            dropped_submissions: self.dropped_submissions,
            dirty: self.dirty,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn has_run_once(&self) -> bool {
        self.has_run_once
    }

    pub fn submission_disabled(&self) -> bool {
        self.submission_disabled
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// Records published by the last non-empty filter run.
    pub fn subset(&self) -> &[EffectRecord] {
        &self.subset
    }

    pub fn pooled_effect(&self) -> Option<PooledEffect> {
        self.pooled
    }

    pub fn error(&self) -> Option<&DisplayError> {
        self.error.as_ref()
    }

    pub fn dropped_submissions(&self) -> usize {
        self.dropped_submissions
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn status_line(&self) -> &'static str {
        if self.in_flight.is_some() {
            return "Running meta-analysis...";
        }
        match self.session {
            SessionState::Uninitialized => "Engine not started",
            SessionState::Provisioning => "Starting engine...",
            SessionState::Ready => "Ready",
            SessionState::Busy => "Running meta-analysis...",
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_criteria(&mut self, criteria: CriteriaSet) {
        self.criteria = criteria;
        self.mark_dirty();
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
        self.mark_dirty();
    }

    pub(crate) fn set_has_run_once(&mut self) {
        self.has_run_once = true;
    }

    pub(crate) fn set_submission_disabled(&mut self, disabled: bool) {
        self.submission_disabled = disabled;
        self.mark_dirty();
    }

    pub(crate) fn set_error(&mut self, error: Option<DisplayError>) {
        self.error = error;
        self.mark_dirty();
    }

    pub(crate) fn set_filter_report(&mut self, report: FilterReport) {
        self.filter_report = Some(report);
    }

    pub(crate) fn publish_subset(&mut self, subset: Vec<EffectRecord>) {
        self.subset = subset;
        self.mark_dirty();
    }

    pub(crate) fn publish_effect(&mut self, effect: PooledEffect) {
        self.pooled = Some(effect);
        self.mark_dirty();
    }

    pub(crate) fn count_dropped_submission(&mut self) {
        self.dropped_submissions += 1;
        self.mark_dirty();
    }

    /// Allocates a request id and marks it as the single outstanding computation.
    pub(crate) fn begin_request(&mut self) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(request_id);
        self.mark_dirty();
        request_id
    }

    /// Clears the outstanding request if `request_id` is it.
    pub(crate) fn finish_request(&mut self, request_id: RequestId) -> bool {
        if self.in_flight == Some(request_id) {
            self.in_flight = None;
            self.mark_dirty();
            true
        } else {
            false
        }
    }
}
