use engine_logging::{engine_debug, engine_info, engine_warn};
use explorer_core::{EffectRecord, PooledEffect, SessionState};
use tokio::sync::watch;

use crate::{EngineError, PoolingBackend, PoolingTable};

/// Single owner of the statistical engine and its lifecycle.
///
/// The lifecycle is `Uninitialized -> Provisioning -> Ready <-> Busy`. The
/// current state lives in a watch channel so the orchestrator can subscribe
/// to transitions; the check-and-set on that value is the only guard against
/// overlapping computations.
pub struct EngineSession<B> {
    backend: B,
    state: watch::Sender<SessionState>,
}

impl<B: PoolingBackend> EngineSession<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self { backend, state }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that observes every later transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Provisions the engine if nobody has yet.
    ///
    /// Activation of an engine that is already provisioning, ready or busy is
    /// a no-op. A failed provisioning returns the session to
    /// `Uninitialized` so it can be retried.
    pub async fn activate(&self) -> Result<(), EngineError> {
        if !self.claim(SessionState::Uninitialized, SessionState::Provisioning) {
            engine_debug!("Activation ignored; session is {}", self.state());
            return Ok(());
        }

        engine_info!("Provisioning statistical engine");
        match self.backend.provision().await {
            Ok(()) => {
                self.transition(SessionState::Ready);
                Ok(())
            }
            Err(err) => {
                engine_warn!("Provisioning failed: {}", err);
                self.transition(SessionState::Uninitialized);
                Err(err)
            }
        }
    }

    /// Pools `records`; only accepted while `Ready`, and holds `Busy` until done.
    ///
    /// A rejected call leaves the session untouched.
    pub async fn compute_pooled_effect(
        &self,
        records: &[EffectRecord],
    ) -> Result<PooledEffect, EngineError> {
        if !self.claim(SessionState::Ready, SessionState::Busy) {
            return Err(EngineError::NotReady {
                state: self.state(),
            });
        }

        let result = self.run_pooling(records).await;
        self.transition(SessionState::Ready);
        result
    }

    async fn run_pooling(&self, records: &[EffectRecord]) -> Result<PooledEffect, EngineError> {
        let table = PoolingTable::from_records(records)?;
        engine_info!(
            "Pooling {} effects from {} studies",
            table.len(),
            table.study_count()
        );
        let [value, lower, upper] = self.backend.pool(&table).await?;
        PooledEffect::new(value, lower, upper).ok_or_else(|| {
            EngineError::InvalidResult(format!(
                "estimate {value} outside interval [{lower}, {upper}]"
            ))
        })
    }

    /// Moves `from -> to` atomically; returns whether the session was in `from`.
    fn claim(&self, from: SessionState, to: SessionState) -> bool {
        let claimed = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if claimed {
            engine_debug!("Session {} -> {}", from, to);
        }
        claimed
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        engine_debug!("Session {} -> {}", previous, next);
    }
}
