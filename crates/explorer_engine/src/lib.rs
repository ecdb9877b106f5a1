//! Explorer engine: statistical engine session and effect execution.
mod backend;
mod orchestrator;
mod session;
mod table;
mod types;

pub use backend::{PoolingBackend, RscriptBackend, RscriptSettings};
pub use orchestrator::Orchestrator;
pub use session::EngineSession;
pub use table::{MarshalError, PoolingTable, COLUMNS};
pub use types::EngineError;
