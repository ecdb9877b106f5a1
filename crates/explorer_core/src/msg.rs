use crate::{CriteriaSet, EngineFailure, PooledEffect, RequestId, SessionState};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Start (or retry) engine provisioning.
    ActivateEngine,
    /// User edited the inclusion criteria; nothing is recomputed yet.
    CriteriaEdited(CriteriaSet),
    /// User submitted the current criteria.
    SubmitClicked,
    /// The engine session moved to a new lifecycle state.
    SessionChanged(SessionState),
    /// Provisioning did not complete; the session is back to uninitialized.
    ProvisioningFailed { message: String },
    /// Engine completion for a pooling request.
    PoolingFinished {
        request_id: RequestId,
        result: Result<PooledEffect, EngineFailure>,
    },
    NoOp,
}
