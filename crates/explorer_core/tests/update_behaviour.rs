use std::sync::Once;

use explorer_core::{
    update, AppState, Corpus, CriteriaSet, DisplayError, Effect, EffectRecord, EngineFailure,
    Facet, Msg, PooledEffect, SessionState,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn record(study_id: &str, outcome: &str) -> EffectRecord {
    EffectRecord {
        study_id: study_id.to_string(),
        outcome_key: "o1".to_string(),
        outcome_subcategory: outcome.to_string(),
        measurement_type: "survey".to_string(),
        intervention_aspect: String::new(),
        intervention_medium: "text".to_string(),
        intervention_appeal: "factual".to_string(),
        sample_country_control: "usa".to_string(),
        sample_country_intervention: "usa".to_string(),
        control_n: 60,
        intervention_n: 60,
        effect_size_value: 0.4,
        effect_size_variance: 0.02,
        group1: "control".to_string(),
        group2: "treatment".to_string(),
    }
}

fn criteria(outcome: &str) -> CriteriaSet {
    CriteriaSet::new()
        .with(Facet::Outcome, [outcome])
        .with(Facet::Measurement, ["survey"])
        .with(Facet::Aspect, ["animal welfare"])
        .with(Facet::Medium, ["text"])
        .with(Facet::Appeal, ["factual"])
        .with(Facet::Country, ["usa"])
        .with_minimum_cell_size(50)
}

fn initial_state() -> AppState {
    let corpus = Corpus::from_records(vec![
        record("s1", "meat consumption"),
        record("s2", "meat consumption"),
        record("s3", "diet intentions"),
    ])
    .unwrap();
    AppState::new(corpus, criteria("meat consumption"))
}

fn effect(value: f64) -> PooledEffect {
    PooledEffect::new(value, value - 0.1, value + 0.1).unwrap()
}

/// Activates the engine and reports it ready, returning the seeded request.
fn ready_state() -> (AppState, u64) {
    let (state, _) = update(initial_state(), Msg::ActivateEngine);
    let (state, _) = update(state, Msg::SessionChanged(SessionState::Provisioning));
    let (state, effects) = update(state, Msg::SessionChanged(SessionState::Ready));
    let request_id = match effects.as_slice() {
        [Effect::ComputePooledEffect { request_id, .. }] => *request_id,
        other => panic!("expected a seeded computation, got {other:?}"),
    };
    (state, request_id)
}

fn completed_state(value: f64) -> AppState {
    let (state, request_id) = ready_state();
    let (state, _) = update(
        state,
        Msg::PoolingFinished {
            request_id,
            result: Ok(effect(value)),
        },
    );
    state
}

#[test]
fn submission_starts_disabled_and_activation_provisions() {
    init_logging();
    let state = initial_state();
    assert!(state.submission_disabled());
    assert!(!state.view().submission_enabled);

    let (state, effects) = update(state, Msg::ActivateEngine);
    assert_eq!(effects, vec![Effect::ProvisionEngine]);
    assert_eq!(state.session(), SessionState::Provisioning);

    let (_state, effects) = update(state, Msg::ActivateEngine);
    assert!(effects.is_empty());
}

#[test]
fn first_ready_seeds_a_computation_with_default_criteria() {
    init_logging();
    let (state, _) = update(initial_state(), Msg::ActivateEngine);
    let (mut state, effects) = update(state, Msg::SessionChanged(SessionState::Ready));

    let ids: Vec<_> = match effects.as_slice() {
        [Effect::ComputePooledEffect { records, .. }] => {
            records.iter().map(|r| r.study_id.as_str()).collect()
        }
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(ids, vec!["s1", "s2"]);
    assert!(state.has_run_once());
    assert!(state.submission_disabled());
    assert_eq!(state.session(), SessionState::Busy);
    assert_eq!(state.view().status, "Running meta-analysis...");
    assert_eq!(state.view().subset_size, 2);
    assert!(state.consume_dirty());
}

#[test]
fn pooled_effect_is_published_and_submission_reenabled() {
    init_logging();
    let state = completed_state(0.4);

    assert_eq!(state.pooled_effect(), Some(effect(0.4)));
    assert_eq!(state.session(), SessionState::Ready);
    assert!(!state.submission_disabled());

    let view = state.view();
    let shown = view.effect.expect("effect view");
    assert_eq!(shown.value, 0.4);
    assert_eq!(shown.interval_label(), "95% CI [0.3, 0.5]");
    assert_eq!(shown.superiority_percent, 61.1);
    assert_eq!(shown.u3_percent, 65.5);
    assert_eq!(view.status, "Ready");
}

#[test]
fn submission_while_busy_is_dropped_not_queued() {
    init_logging();
    let (state, request_id) = ready_state();
    let (state, _) = update(state, Msg::CriteriaEdited(criteria("diet intentions")));
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert!(effects.is_empty());
    assert_eq!(state.dropped_submissions(), 1);
    assert_eq!(state.in_flight(), Some(request_id));

    // Completion does not replay the dropped submission.
    let (state, effects) = update(
        state,
        Msg::PoolingFinished {
            request_id,
            result: Ok(effect(0.2)),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.pooled_effect(), Some(effect(0.2)));
    assert_eq!(state.subset().len(), 2);
}

#[test]
fn resubmission_after_ready_runs_new_criteria() {
    init_logging();
    let state = completed_state(0.4);
    let (state, _) = update(state, Msg::CriteriaEdited(criteria("diet intentions")));
    let (state, effects) = update(state, Msg::SubmitClicked);

    match effects.as_slice() {
        [Effect::ComputePooledEffect { request_id, records }] => {
            assert_eq!(*request_id, 2);
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].study_id, "s3");
        }
        other => panic!("unexpected effects {other:?}"),
    }
    assert!(state.submission_disabled());
}

#[test]
fn empty_result_keeps_previous_effect_and_reenables_submission() {
    init_logging();
    let state = completed_state(0.4);
    let (state, _) = update(state, Msg::CriteriaEdited(criteria("moral judgment")));
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert!(effects.is_empty());
    assert_eq!(state.error(), Some(&DisplayError::NoMatches));
    assert_eq!(state.pooled_effect(), Some(effect(0.4)));
    assert_eq!(state.subset().len(), 2);
    assert!(!state.submission_disabled());
    assert_eq!(
        state.view().error.as_deref(),
        Some("No papers match these criteria")
    );
}

#[test]
fn invalid_criteria_are_reported_without_filtering() {
    init_logging();
    let state = completed_state(0.4);
    let invalid = criteria("meat consumption").with(Facet::Country, Vec::<String>::new());
    let (state, _) = update(state, Msg::CriteriaEdited(invalid));
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert!(effects.is_empty());
    assert_eq!(
        state.view().error.as_deref(),
        Some("Must select at least one country.")
    );
    assert!(!state.submission_disabled());
}

#[test]
fn engine_failure_is_transient_and_keeps_prior_effect() {
    init_logging();
    let state = completed_state(0.4);
    let (state, effects) = update(state, Msg::SubmitClicked);
    let request_id = match effects.as_slice() {
        [Effect::ComputePooledEffect { request_id, .. }] => *request_id,
        other => panic!("unexpected effects {other:?}"),
    };

    let (state, _) = update(
        state,
        Msg::PoolingFinished {
            request_id,
            result: Err(EngineFailure::Invocation("singular matrix".to_string())),
        },
    );
    assert_eq!(state.pooled_effect(), Some(effect(0.4)));
    assert_eq!(
        state.error(),
        Some(&DisplayError::EngineFailed("singular matrix".to_string()))
    );
    assert!(!state.submission_disabled());
    assert_eq!(state.session(), SessionState::Ready);
}

#[test]
fn not_ready_rejection_leaves_effect_untouched() {
    init_logging();
    let (state, request_id) = ready_state();
    let (state, _) = update(state, Msg::SessionChanged(SessionState::Provisioning));
    let (state, _) = update(
        state,
        Msg::PoolingFinished {
            request_id,
            result: Err(EngineFailure::NotReady),
        },
    );

    assert_eq!(state.pooled_effect(), None);
    assert_eq!(state.error(), Some(&DisplayError::EngineNotReady));
    assert!(state.submission_disabled());
}

#[test]
fn submissions_before_ready_never_reach_the_engine() {
    init_logging();
    let (state, _) = update(initial_state(), Msg::ActivateEngine);
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert!(effects.is_empty());
    assert_eq!(state.dropped_submissions(), 1);
    assert!(!state.has_run_once());
}

#[test]
fn stale_completion_is_ignored() {
    init_logging();
    let state = completed_state(0.4);
    let before = state.view();
    let (state, effects) = update(
        state,
        Msg::PoolingFinished {
            request_id: 99,
            result: Ok(effect(1.5)),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn later_ready_transitions_do_not_reseed() {
    init_logging();
    let state = completed_state(0.4);
    let (state, effects) = update(state, Msg::SessionChanged(SessionState::Ready));

    assert!(effects.is_empty());
    assert!(!state.submission_disabled());
}

#[test]
fn provisioning_failure_can_be_retried() {
    init_logging();
    let (state, _) = update(initial_state(), Msg::ActivateEngine);
    let (state, _) = update(
        state,
        Msg::ProvisioningFailed {
            message: "Rscript not found".to_string(),
        },
    );
    assert_eq!(state.session(), SessionState::Uninitialized);
    assert_eq!(
        state.view().error.as_deref(),
        Some("Could not start the statistical engine: Rscript not found")
    );

    let (state, effects) = update(state, Msg::ActivateEngine);
    assert_eq!(effects, vec![Effect::ProvisionEngine]);
    assert_eq!(state.error(), None);
}
