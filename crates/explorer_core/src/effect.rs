use crate::{EffectRecord, RequestId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ProvisionEngine,
    ComputePooledEffect {
        request_id: RequestId,
        records: Vec<EffectRecord>,
    },
}
