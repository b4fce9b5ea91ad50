//! Shared opening graph for ingested kifu: position nodes keyed by canonical
//! fingerprints, move edges keyed by ordered position pairs, per-category
//! win/draw statistics, and the submission pipeline that feeds them.

pub mod error;
pub mod memory;
pub mod model;
pub mod store;
pub mod submit;
pub mod upsert;

pub use error::StoreError;
pub use memory::{MemoryGraphStore, MemorySourceDirectory};
pub use model::{
    GameId, GameResult, GameSource, MoveEdge, MoveId, NewGame, PositionId, PositionNode,
    SourceCategory, SourceId,
};
pub use store::{GraphStore, GraphTxn, SourceDirectory};
pub use submit::{KifuSubmission, SubmissionOutcome, SubmitError, Submitter};
pub use upsert::apply_game;
