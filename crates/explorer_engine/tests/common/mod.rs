#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use explorer_core::EffectRecord;
use explorer_engine::{EngineError, PoolingBackend, PoolingTable};
use tokio::sync::Semaphore;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
struct Inner {
    provision_error: Mutex<Option<String>>,
    results: Mutex<VecDeque<Result<[f64; 3], EngineError>>>,
    tables: Mutex<Vec<PoolingTable>>,
    gate: Option<Semaphore>,
    provision_gate: Option<Semaphore>,
}

/// Backend that replays queued results, optionally holding each call until released.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Inner>,
}

impl ScriptedBackend {
    pub fn gated() -> Self {
        Self {
            inner: Arc::new(Inner {
                gate: Some(Semaphore::new(0)),
                ..Inner::default()
            }),
        }
    }

    /// Provisioning waits for [`ScriptedBackend::release_provisioning`].
    pub fn gated_provisioning() -> Self {
        Self {
            inner: Arc::new(Inner {
                provision_gate: Some(Semaphore::new(0)),
                ..Inner::default()
            }),
        }
    }

    pub fn release_provisioning(&self) {
        if let Some(gate) = &self.inner.provision_gate {
            gate.add_permits(1);
        }
    }

    pub fn push_result(&self, result: Result<[f64; 3], EngineError>) {
        self.inner.results.lock().unwrap().push_back(result);
    }

    pub fn fail_provisioning(&self, message: &str) {
        *self.inner.provision_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_provisioning_failure(&self) {
        *self.inner.provision_error.lock().unwrap() = None;
    }

    pub fn tables(&self) -> Vec<PoolingTable> {
        self.inner.tables.lock().unwrap().clone()
    }

    pub fn release(&self) {
        if let Some(gate) = &self.inner.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.tables.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PoolingBackend for ScriptedBackend {
    async fn provision(&self) -> Result<(), EngineError> {
        if let Some(gate) = &self.inner.provision_gate {
            gate.acquire().await.expect("gate open").forget();
        }
        match self.inner.provision_error.lock().unwrap().clone() {
            Some(message) => Err(EngineError::Provisioning(message)),
            None => Ok(()),
        }
    }

    async fn pool(&self, table: &PoolingTable) -> Result<[f64; 3], EngineError> {
        self.inner.tables.lock().unwrap().push(table.clone());
        if let Some(gate) = &self.inner.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        let next = self.inner.results.lock().unwrap().pop_front();
        next.unwrap_or(Ok([0.4, 0.3, 0.5]))
    }
}

pub fn record(study_id: &str) -> EffectRecord {
    EffectRecord {
        study_id: study_id.to_string(),
        outcome_key: "o1".to_string(),
        outcome_subcategory: "meat consumption".to_string(),
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
