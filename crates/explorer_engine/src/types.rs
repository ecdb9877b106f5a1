use explorer_core::{EngineFailure, SessionState};
use thiserror::Error;

use crate::table::MarshalError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("engine is {state}, not ready")]
    NotReady { state: SessionState },
    #[error("could not marshal records: {0}")]
    Marshal(#[from] MarshalError),
    #[error("provisioning failed: {0}")]
    Provisioning(String),
    #[error("engine invocation failed: {0}")]
    Invocation(String),
    #[error("engine returned an invalid result: {0}")]
    InvalidResult(String),
}

impl EngineError {
    pub(crate) fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation(message.into())
    }

    pub(crate) fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning(message.into())
    }

    /// Display-safe form handed to the state machine.
    ///
    /// Invocation messages pass through bare; the display layer adds its own prefix.
    pub fn into_failure(self) -> EngineFailure {
        match self {
            EngineError::NotReady { .. } => EngineFailure::NotReady,
            EngineError::Invocation(message) | EngineError::Provisioning(message) => {
                EngineFailure::Invocation(message)
            }
            EngineError::Marshal(err) => EngineFailure::Invocation(err.to_string()),
            other @ EngineError::InvalidResult(_) => EngineFailure::Invocation(other.to_string()),
        }
    }
}
