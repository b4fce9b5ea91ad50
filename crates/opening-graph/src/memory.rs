//! In-process graph store for tests and local development.
//!
//! The whole graph sits behind one `tokio::sync::Mutex`; a transaction holds
//! the owned guard for its lifetime, which serializes submissions and makes
//! every find-or-create trivially atomic. Rollback restores the snapshot
//! taken at `begin`.

use std::collections::HashMap;
use std::sync::Arc;

use kifu_core::Handicap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;
use crate::model::{
    GameId, GameResult, GameSource, MoveEdge, MoveId, NewGame, PositionId, PositionNode,
    SourceCategory,
};
use crate::store::{GraphStore, GraphTxn, SourceDirectory};

/// Per-category win/draw tally of one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultTally {
    pub black_wins: u64,
    pub white_wins: u64,
    pub draws: u64,
}

#[derive(Debug, Clone)]
pub struct PositionRow {
    pub id: PositionId,
    pub fingerprint: String,
    pub display: String,
    pub handicap: Handicap,
    pub opening: Option<String>,
    /// Indexed by [`category_index`].
    pub stats: [ResultTally; 2],
}

#[derive(Debug, Clone)]
pub struct MoveRow {
    pub id: MoveId,
    pub from: PositionId,
    pub to: PositionId,
    pub notation: String,
    pub totals: [u64; 2],
}

#[derive(Debug, Clone)]
pub struct GameRow {
    pub id: GameId,
    pub game: NewGame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppearanceRow {
    pub game: GameId,
    pub position: PositionId,
    pub ply: usize,
    pub next_move: Option<MoveId>,
}

pub fn category_index(category: SourceCategory) -> usize {
    match category {
        SourceCategory::Professional => 0,
        SourceCategory::AmateurOnline => 1,
    }
}

/// Full graph contents, cloneable for snapshots and test assertions.
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    next_id: i64,
    pub positions: Vec<PositionRow>,
    pub moves: Vec<MoveRow>,
    pub games: Vec<GameRow>,
    pub appearances: Vec<AppearanceRow>,
}

impl GraphData {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn position(&self, fingerprint: &str) -> Option<&PositionRow> {
        self.positions.iter().find(|p| p.fingerprint == fingerprint)
    }

    pub fn edge(&self, from: PositionId, to: PositionId) -> Option<&MoveRow> {
        self.moves.iter().find(|m| m.from == from && m.to == to)
    }

    pub fn links_of(&self, game: GameId) -> Vec<&AppearanceRow> {
        self.appearances.iter().filter(|a| a.game == game).collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryGraphStore {
    inner: Arc<Mutex<GraphData>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the current graph contents for inspection.
    pub async fn dump(&self) -> GraphData {
        self.inner.lock().await.clone()
    }
}

pub struct MemoryTxn {
    guard: OwnedMutexGuard<GraphData>,
    undo: Option<GraphData>,
}

impl MemoryTxn {
    fn restore(&mut self) {
        if let Some(undo) = self.undo.take() {
            *self.guard = undo;
        }
    }
}

impl Drop for MemoryTxn {
    fn drop(&mut self) {
        // A transaction dropped without an explicit commit rolls back.
        self.restore();
    }
}

impl GraphStore for MemoryGraphStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, StoreError> {
        let guard = self.inner.clone().lock_owned().await;
        let undo = Some(guard.clone());
        Ok(MemoryTxn { guard, undo })
    }

    async fn save_game(&self, game: &NewGame) -> Result<GameId, StoreError> {
        let mut data = self.inner.lock().await;
        let duplicate = data.games.iter().any(|row| {
            row.game.source == game.source
                && row.game.black_name == game.black_name
                && row.game.white_name == game.white_name
                && row.game.played_on == game.played_on
                && row.game.notation == game.notation
        });
        if duplicate {
            return Err(StoreError::DuplicateGame);
        }
        let id = data.alloc_id();
        data.games.push(GameRow {
            id,
            game: game.clone(),
        });
        Ok(id)
    }

    async fn delete_game(&self, id: GameId) -> Result<(), StoreError> {
        let mut data = self.inner.lock().await;
        data.games.retain(|row| row.id != id);
        data.appearances.retain(|row| row.game != id);
        Ok(())
    }
}

impl GraphTxn for MemoryTxn {
    async fn find_or_create_position(
        &mut self,
        fingerprint: &str,
        display: &str,
        handicap: Handicap,
    ) -> Result<PositionNode, StoreError> {
        if let Some(row) = self.guard.position(fingerprint) {
            return Ok(PositionNode {
                id: row.id,
                fingerprint: row.fingerprint.clone(),
                opening: row.opening.clone(),
            });
        }
        let id = self.guard.alloc_id();
        self.guard.positions.push(PositionRow {
            id,
            fingerprint: fingerprint.to_string(),
            display: display.to_string(),
            handicap,
            opening: None,
            stats: [ResultTally::default(); 2],
        });
        Ok(PositionNode {
            id,
            fingerprint: fingerprint.to_string(),
            opening: None,
        })
    }

    async fn find_or_create_move(
        &mut self,
        from: PositionId,
        to: PositionId,
        notation: &str,
    ) -> Result<MoveEdge, StoreError> {
        if let Some(row) = self.guard.edge(from, to) {
            return Ok(MoveEdge {
                id: row.id,
                from: row.from,
                to: row.to,
                notation: row.notation.clone(),
            });
        }
        let id = self.guard.alloc_id();
        self.guard.moves.push(MoveRow {
            id,
            from,
            to,
            notation: notation.to_string(),
            totals: [0; 2],
        });
        Ok(MoveEdge {
            id,
            from,
            to,
            notation: notation.to_string(),
        })
    }

    async fn bump_position_result(
        &mut self,
        id: PositionId,
        category: SourceCategory,
        result: GameResult,
    ) -> Result<(), StoreError> {
        let row = self
            .guard
            .positions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("unknown position id {id}")))?;
        let tally = &mut row.stats[category_index(category)];
        match result {
            GameResult::BlackWin => tally.black_wins += 1,
            GameResult::WhiteWin => tally.white_wins += 1,
            GameResult::Draw => tally.draws += 1,
        }
        Ok(())
    }

    async fn bump_move_total(
        &mut self,
        id: MoveId,
        category: SourceCategory,
    ) -> Result<(), StoreError> {
        let row = self
            .guard
            .moves
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("unknown move id {id}")))?;
        row.totals[category_index(category)] += 1;
        Ok(())
    }

    async fn set_opening_if_empty(
        &mut self,
        id: PositionId,
        opening: &str,
    ) -> Result<(), StoreError> {
        if let Some(row) = self.guard.positions.iter_mut().find(|p| p.id == id) {
            if row.opening.is_none() {
                row.opening = Some(opening.to_string());
            }
        }
        Ok(())
    }

    async fn link_game(
        &mut self,
        game: GameId,
        position: PositionId,
        ply: usize,
        next_move: Option<MoveId>,
    ) -> Result<(), StoreError> {
        let exists = self
            .guard
            .appearances
            .iter()
            .any(|a| a.game == game && a.position == position);
        if !exists {
            self.guard.appearances.push(AppearanceRow {
                game,
                position,
                ply,
                next_move,
            });
        }
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        self.undo = None;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.restore();
        Ok(())
    }
}

/// Static password -> source map.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceDirectory {
    by_pass: HashMap<String, GameSource>,
}

impl MemorySourceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pass: impl Into<String>, source: GameSource) {
        self.by_pass.insert(pass.into(), source);
    }
}

impl SourceDirectory for MemorySourceDirectory {
    async fn resolve_trusted_source(
        &self,
        pass: &str,
    ) -> Result<Option<GameSource>, StoreError> {
        Ok(self.by_pass.get(pass).cloned())
    }
}
