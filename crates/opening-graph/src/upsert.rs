//! Graph upsert for one replayed game: deduplicate positions and edges, then
//! apply statistics exactly once per distinct node/edge for this submission.

use std::collections::{HashMap, HashSet};

use kifu_core::{CsaMove, Handicap, PositionSnapshot};
use tracing::debug;

use crate::error::StoreError;
use crate::model::{GameId, GameResult, MoveId, PositionId, SourceCategory};
use crate::store::GraphTxn;

/// Upsert one game's traversal into the graph inside the caller's
/// transaction.
///
/// `snapshots` is the ordered position sequence (initial position first) and
/// `moves` the parallel token sequence, one shorter. A `category` of `None`
/// (unrecognized source category) records the game and its links but skips
/// every statistics increment.
///
/// The touched-sets are scoped to this submission: a fingerprint or edge
/// recurring within one game touches its row at most once, while the carried
/// opening classification still follows the traversal across repeats.
pub async fn apply_game<T: GraphTxn>(
    txn: &mut T,
    game_id: GameId,
    snapshots: &[PositionSnapshot],
    moves: &[CsaMove],
    handicap: Handicap,
    category: Option<SourceCategory>,
    result: GameResult,
) -> Result<(), StoreError> {
    let mut nodes = Vec::with_capacity(snapshots.len());
    for snap in snapshots {
        let node = txn
            .find_or_create_position(&snap.fingerprint, &snap.display, handicap)
            .await?;
        nodes.push(node);
    }

    let mut edges = Vec::with_capacity(nodes.len().saturating_sub(1));
    for (i, pair) in nodes.windows(2).enumerate() {
        let edge = txn
            .find_or_create_move(pair[0].id, pair[1].id, &moves[i].text)
            .await?;
        edges.push(edge);
    }

    let mut touched_positions: HashSet<PositionId> = HashSet::new();
    let mut touched_moves: HashSet<MoveId> = HashSet::new();

    // Current opening classification per node, updated as we propagate.
    let mut openings: HashMap<PositionId, Option<String>> = nodes
        .iter()
        .map(|n| (n.id, n.opening.clone()))
        .collect();
    let mut carried: Option<String> = None;

    for (i, node) in nodes.iter().enumerate() {
        let next_edge = edges.get(i);

        if let Some(edge) = next_edge {
            if touched_moves.insert(edge.id) {
                if let Some(category) = category {
                    txn.bump_move_total(edge.id, category).await?;
                }
            }
        }

        if touched_positions.insert(node.id) {
            if let Some(category) = category {
                txn.bump_position_result(node.id, category, result).await?;
            }
            if openings[&node.id].is_none() {
                if let Some(opening) = carried.as_deref() {
                    txn.set_opening_if_empty(node.id, opening).await?;
                    openings.insert(node.id, Some(opening.to_string()));
                }
            }
            txn.link_game(game_id, node.id, i, next_edge.map(|e| e.id))
                .await?;
        }

        if let Some(opening) = openings[&node.id].clone() {
            carried = Some(opening);
        }
    }

    debug!(
        game_id,
        positions = nodes.len(),
        moves = edges.len(),
        "graph upsert applied"
    );
    Ok(())
}
