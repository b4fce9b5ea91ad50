//! Replay a tokenized kifu against a fresh board, capturing one snapshot per
//! reached position.

use crate::board::Board;
use crate::csa::{tokenize, CsaMove};
use crate::error::KifuError;
use crate::handicap::Handicap;

/// Persistable view of one reached position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSnapshot {
    pub fingerprint: String,
    pub display: String,
}

/// Outcome of replaying a full kifu: N applied moves and N+1 snapshots, the
/// first being the handicap starting position.
#[derive(Debug, Clone)]
pub struct Replay {
    pub handicap: Handicap,
    pub snapshots: Vec<PositionSnapshot>,
    pub moves: Vec<CsaMove>,
    pub resigned: bool,
}

/// Tokenize `notation` and apply every move in order from the handicap's
/// starting placement. Stops at the first unappliable token; a trailing
/// resignation marker ends the replay with the state unchanged.
pub fn replay(handicap: Handicap, notation: &str) -> Result<Replay, KifuError> {
    let kifu = tokenize(notation)?;
    let mut board = Board::new(handicap);

    let mut snapshots = Vec::with_capacity(kifu.moves.len() + 1);
    snapshots.push(snapshot(&board));
    for mv in &kifu.moves {
        board.apply(mv)?;
        snapshots.push(snapshot(&board));
    }

    Ok(Replay {
        handicap,
        snapshots,
        moves: kifu.moves,
        resigned: kifu.resigned,
    })
}

fn snapshot(board: &Board) -> PositionSnapshot {
    PositionSnapshot {
        fingerprint: board.fingerprint(),
        display: board.display(),
    }
}
