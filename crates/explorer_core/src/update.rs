use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::filter::{filter, EmptyResultError, FilteredSubset};
use crate::{AppState, DisplayError, Effect, EngineFailure, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ActivateEngine => {
            if state.session() != SessionState::Uninitialized {
                return (state, Vec::new());
            }
            if matches!(state.error(), Some(DisplayError::ProvisioningFailed(_))) {
                state.set_error(None);
            }
            state.set_session(SessionState::Provisioning);
            vec![Effect::ProvisionEngine]
        }
        Msg::CriteriaEdited(criteria) => {
            state.set_criteria(criteria);
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.submission_disabled() {
                // Dropped, never queued: the view keeps showing the last completed result.
                engine_warn!(
                    "Submission dropped while session is {} (in flight: {:?})",
                    state.session(),
                    state.in_flight()
                );
                state.count_dropped_submission();
                return (state, Vec::new());
            }
            run_submission(&mut state)
        }
        Msg::SessionChanged(session) => {
            state.set_session(session);
            match session {
                SessionState::Ready if !state.has_run_once() => {
                    engine_info!("Engine ready; seeding the initial computation");
                    state.set_has_run_once();
                    state.set_submission_disabled(false);
                    run_submission(&mut state)
                }
                SessionState::Ready => {
                    let outstanding = state.in_flight().is_some();
                    state.set_submission_disabled(outstanding);
                    Vec::new()
                }
                SessionState::Uninitialized | SessionState::Provisioning | SessionState::Busy => {
                    state.set_submission_disabled(true);
                    Vec::new()
                }
            }
        }
        Msg::ProvisioningFailed { message } => {
            engine_warn!("Engine provisioning failed: {}", message);
            state.set_session(SessionState::Uninitialized);
            state.set_submission_disabled(true);
            state.set_error(Some(DisplayError::ProvisioningFailed(message)));
            Vec::new()
        }
        Msg::PoolingFinished { request_id, result } => {
            if !state.finish_request(request_id) {
                engine_debug!("Ignoring completion of stale request {}", request_id);
                return (state, Vec::new());
            }
            // The session always returns to ready before reporting completion.
            if state.session() == SessionState::Busy {
                state.set_session(SessionState::Ready);
            }
            match result {
                Ok(effect) => {
                    engine_info!(
                        "Request {} pooled d={:.4} [{:.4}, {:.4}]",
                        request_id,
                        effect.value(),
                        effect.lower(),
                        effect.upper()
                    );
                    state.publish_effect(effect);
                    state.set_error(None);
                    state.set_submission_disabled(false);
                }
                Err(EngineFailure::NotReady) => {
                    engine_warn!("Request {} rejected: engine not ready", request_id);
                    state.set_error(Some(DisplayError::EngineNotReady));
                    let ready = state.session() == SessionState::Ready;
                    state.set_submission_disabled(!ready);
                }
                Err(EngineFailure::Invocation(message)) => {
                    engine_warn!("Request {} failed: {}", request_id, message);
                    state.set_error(Some(DisplayError::EngineFailed(message)));
                    state.set_submission_disabled(false);
                }
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Validates and filters the current criteria, dispatching a computation when the engine is ready.
fn run_submission(state: &mut AppState) -> Vec<Effect> {
    if let Err(err) = state.criteria().validate() {
        state.set_error(Some(DisplayError::InvalidCriteria(err)));
        return Vec::new();
    }

    let corpus = state.corpus().clone();
    let subset = match filter(&corpus, state.criteria()) {
        Ok(FilteredSubset { records, report }) => {
            let records: Vec<_> = records.into_iter().cloned().collect();
            state.set_filter_report(report);
            records
        }
        Err(EmptyResultError { report }) => {
            engine_info!("No records match the submitted criteria");
            state.set_filter_report(report);
            state.set_error(Some(DisplayError::NoMatches));
            return Vec::new();
        }
    };

    state.set_error(None);
    state.publish_subset(subset.clone());

    if state.session() != SessionState::Ready {
        engine_debug!(
            "Filtered {} records; engine is {}, not pooling",
            subset.len(),
            state.session()
        );
        return Vec::new();
    }

    state.set_has_run_once();
    state.set_submission_disabled(true);
    state.set_session(SessionState::Busy);
    let request_id = state.begin_request();
    engine_info!(
        "Running meta-analysis over {} records (request {})",
        subset.len(),
        request_id
    );
    vec![Effect::ComputePooledEffect {
        request_id,
        records: subset,
    }]
}
