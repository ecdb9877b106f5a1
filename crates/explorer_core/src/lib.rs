//! Explorer core: effect records, the filter engine, interpretability
//! statistics and the pure recompute state machine.
mod corpus;
mod criteria;
mod effect;
pub mod filter;
mod msg;
mod record;
mod state;
pub mod stats;
mod update;
mod view_model;
mod vocabulary;

pub use corpus::{Corpus, CorpusLoadError};
pub use criteria::{CriteriaError, CriteriaSet, Facet};
pub use effect::Effect;
pub use filter::{filter, EmptyResultError, FilterReport, FilterStage, FilteredSubset};
pub use msg::Msg;
pub use record::{EffectRecord, PooledEffect};
pub use state::{AppState, DisplayError, EngineFailure, RequestId, SessionState};
pub use update::update;
pub use view_model::{AppViewModel, EffectView, EFFECT_DIGITS, PERCENT_DIGITS};
pub use vocabulary::{FacetOption, OptionGroup, Vocabulary, VocabularyError};
