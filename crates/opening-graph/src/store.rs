//! Storage-collaborator interfaces the host must provide.
//!
//! The graph is the one resource shared between concurrent submissions, so
//! the find-or-create operations must be atomic check-and-creates (two
//! submissions racing on the same key converge on one row) and the counter
//! bumps atomic read-modify-writes. Everything a [`GraphTxn`] does belongs to
//! a single transaction; `rollback` leaves no trace of it.

use kifu_core::Handicap;

use crate::error::StoreError;
use crate::model::{
    GameId, GameResult, GameSource, MoveEdge, MoveId, NewGame, PositionId, PositionNode,
    SourceCategory,
};

/// One submission's transactional view of the shared graph.
#[allow(async_fn_in_trait)]
pub trait GraphTxn: Sized + Send {
    /// Resolve the node for `fingerprint`, creating it with the given display
    /// form and handicap only if absent. Atomic per key.
    async fn find_or_create_position(
        &mut self,
        fingerprint: &str,
        display: &str,
        handicap: Handicap,
    ) -> Result<PositionNode, StoreError>;

    /// Resolve the edge for the ordered pair, recording `notation` only on
    /// creation. Atomic per pair.
    async fn find_or_create_move(
        &mut self,
        from: PositionId,
        to: PositionId,
        notation: &str,
    ) -> Result<MoveEdge, StoreError>;

    /// Increment the node's result counter for the given category.
    async fn bump_position_result(
        &mut self,
        id: PositionId,
        category: SourceCategory,
        result: GameResult,
    ) -> Result<(), StoreError>;

    /// Increment the edge's traversal total for the given category.
    async fn bump_move_total(
        &mut self,
        id: MoveId,
        category: SourceCategory,
    ) -> Result<(), StoreError>;

    /// Set the node's opening classification unless one is already present.
    /// The first successful write wins and is never overwritten.
    async fn set_opening_if_empty(
        &mut self,
        id: PositionId,
        opening: &str,
    ) -> Result<(), StoreError>;

    /// Associate the game with a position it passes through, with the ply
    /// index and the edge the game leaves the position by.
    async fn link_game(
        &mut self,
        game: GameId,
        position: PositionId,
        ply: usize,
        next_move: Option<MoveId>,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Handle to the persistent graph.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    type Txn: GraphTxn;

    async fn begin(&self) -> Result<Self::Txn, StoreError>;

    /// Persist a game record, returning its id explicitly so callers never
    /// have to rely on "most recent row" lookups. Fails with
    /// [`StoreError::DuplicateGame`] before any graph mutation happens.
    async fn save_game(&self, game: &NewGame) -> Result<GameId, StoreError>;

    /// Remove a game record (and its links) after a failed submission.
    async fn delete_game(&self, id: GameId) -> Result<(), StoreError>;
}

/// Credential collaborator: maps a submission password to a trusted source.
#[allow(async_fn_in_trait)]
pub trait SourceDirectory {
    async fn resolve_trusted_source(&self, pass: &str)
        -> Result<Option<GameSource>, StoreError>;
}
