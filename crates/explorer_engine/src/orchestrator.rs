use std::sync::Arc;

use engine_logging::{engine_debug, engine_info};
use explorer_core::{update, AppState, AppViewModel, Effect, Msg, SessionState};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};

use crate::{EngineError, EngineSession, PoolingBackend};

/// What woke the driver up.
enum Wake {
    SessionChanged,
    Completed(Msg),
    Inbox(Option<Msg>),
    Idle,
}

/// Executes the effects produced by [`update`] against the engine session.
///
/// All work runs on the caller's task; the only suspension points are engine
/// provisioning and pooling calls. Session transitions arrive through the
/// session's watch channel and are fed back as [`Msg::SessionChanged`].
pub struct Orchestrator<B: PoolingBackend + 'static> {
    session: Arc<EngineSession<B>>,
    session_rx: watch::Receiver<SessionState>,
    state: AppState,
    pending: FuturesUnordered<BoxFuture<'static, Msg>>,
}

impl<B: PoolingBackend + 'static> Orchestrator<B> {
    pub fn new(session: EngineSession<B>, state: AppState) -> Self {
        let session_rx = session.subscribe();
        Self {
            session: Arc::new(session),
            session_rx,
            state,
            pending: FuturesUnordered::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn session(&self) -> &EngineSession<B> {
        &self.session
    }

    /// No engine call is outstanding and every transition has been applied.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && !self.session_rx.has_changed().unwrap_or(false)
    }

    /// Applies a message and starts any engine work it requests.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.start(effect);
        }
    }

    /// Waits for the next engine event and applies it.
    ///
    /// Returns `false` without waiting when nothing is outstanding.
    pub async fn step(&mut self) -> bool {
        match self.wait(None).await {
            Wake::Idle => false,
            wake => {
                self.apply(wake);
                true
            }
        }
    }

    /// Drives outstanding engine work to completion.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Event loop: interleaves inbox messages with engine events until the
    /// inbox is closed and no work is outstanding.
    ///
    /// `on_view` is called whenever the view model changed.
    pub async fn run<F>(mut self, mut inbox: mpsc::UnboundedReceiver<Msg>, mut on_view: F) -> AppState
    where
        F: FnMut(&AppViewModel),
    {
        let mut inbox_open = true;
        loop {
            self.publish(&mut on_view);
            let inbox_ref = if inbox_open { Some(&mut inbox) } else { None };
            match self.wait(inbox_ref).await {
                Wake::Idle => break,
                Wake::Inbox(None) => {
                    engine_debug!("Inbox closed; draining outstanding engine work");
                    inbox_open = false;
                }
                wake => self.apply(wake),
            }
        }
        self.publish(&mut on_view);
        self.state
    }

    fn publish<F: FnMut(&AppViewModel)>(&mut self, on_view: &mut F) {
        if self.state.consume_dirty() {
            on_view(&self.state.view());
        }
    }

    fn apply(&mut self, wake: Wake) {
        match wake {
            Wake::SessionChanged => {
                let session = *self.session_rx.borrow_and_update();
                self.dispatch(Msg::SessionChanged(session));
            }
            Wake::Completed(msg) | Wake::Inbox(Some(msg)) => self.dispatch(msg),
            Wake::Inbox(None) | Wake::Idle => {}
        }
    }

    async fn wait(&mut self, inbox: Option<&mut mpsc::UnboundedReceiver<Msg>>) -> Wake {
        if self.session_rx.has_changed().unwrap_or(false) {
            return Wake::SessionChanged;
        }
        if self.pending.is_empty() && inbox.is_none() {
            return Wake::Idle;
        }

        let has_pending = !self.pending.is_empty();
        let inbox_recv = async move {
            match inbox {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            Ok(()) = self.session_rx.changed() => Wake::SessionChanged,
            Some(msg) = self.pending.next(), if has_pending => Wake::Completed(msg),
            msg = inbox_recv => Wake::Inbox(msg),
        }
    }

    fn start(&mut self, effect: Effect) {
        let session = Arc::clone(&self.session);
        match effect {
            Effect::ProvisionEngine => {
                engine_info!("Starting statistical engine");
                self.pending.push(
                    async move {
                        match session.activate().await {
                            Ok(()) => Msg::NoOp,
                            Err(EngineError::Provisioning(message)) => {
                                Msg::ProvisioningFailed { message }
                            }
                            Err(err) => Msg::ProvisioningFailed {
                                message: err.to_string(),
                            },
                        }
                    }
                    .boxed(),
                );
            }
            Effect::ComputePooledEffect {
                request_id,
                records,
            } => {
                engine_debug!(
                    "Dispatching request {} with {} records",
                    request_id,
                    records.len()
                );
                self.pending.push(
                    async move {
                        let result = session
                            .compute_pooled_effect(&records)
                            .await
                            .map_err(|err| err.into_failure());
                        Msg::PoolingFinished { request_id, result }
                    }
                    .boxed(),
                );
            }
        }
    }
}
