pub mod classification;
pub mod dependency_parse;
pub mod error;
pub mod failure;
pub mod gate;
pub mod identity;
pub mod join;
pub mod output;
pub mod sentence;
pub mod store;
pub mod text;
pub mod traits;
pub mod upsert;

pub use error::{DependencyParseError, StageError};
pub use failure::FailureReporter;
pub use gate::{success_status_updates, StageGate};
pub use join::{co_group, join_pair, CoGroup, JoinError, Joined, PairJoin};
pub use output::StageOutput;
pub use upsert::{EvidenceRecord, PredicateScore};
