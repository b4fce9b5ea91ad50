//! Persisted-graph model types: sources, results, position nodes, move edges
//! and game records.

use chrono::NaiveDate;
use kifu_core::Handicap;
use serde::{Deserialize, Serialize};

pub type PositionId = i64;
pub type MoveId = i64;
pub type GameId = i64;
pub type SourceId = i64;

/// The two recognized statistics buckets. Sources carrying any other
/// category code are trusted submitters whose games are stored and linked but
/// never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    /// Official professional kifu.
    Professional,
    /// Amateur online games.
    AmateurOnline,
}

impl SourceCategory {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(SourceCategory::Professional),
            2 => Some(SourceCategory::AmateurOnline),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        match self {
            SourceCategory::Professional => 1,
            SourceCategory::AmateurOnline => 2,
        }
    }
}

/// A trusted kifu provider, resolved by its submission password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSource {
    pub id: SourceId,
    pub name: String,
    pub category_code: i16,
    /// URL prefix for linking back to the provider's own kifu viewer.
    pub kifu_url_header: Option<String>,
}

impl GameSource {
    /// Which statistics bucket this source feeds, if any.
    pub fn stats_category(&self) -> Option<SourceCategory> {
        SourceCategory::from_code(self.category_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    BlackWin,
    WhiteWin,
    Draw,
}

impl GameResult {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(GameResult::BlackWin),
            1 => Some(GameResult::WhiteWin),
            2 => Some(GameResult::Draw),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        match self {
            GameResult::BlackWin => 0,
            GameResult::WhiteWin => 1,
            GameResult::Draw => 2,
        }
    }
}

/// Resolved position node. Display form, handicap and the statistics
/// counters stay in storage; the upsert only needs the id and the current
/// opening classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionNode {
    pub id: PositionId,
    pub fingerprint: String,
    pub opening: Option<String>,
}

/// Resolved move edge, unique per ordered (from, to) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEdge {
    pub id: MoveId,
    pub from: PositionId,
    pub to: PositionId,
    pub notation: String,
}

/// A game record to persist. The tuple (source, players, date, notation) is
/// its canonical identity for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub source: SourceId,
    pub black_name: String,
    pub white_name: String,
    pub played_on: Option<NaiveDate>,
    pub handicap: Handicap,
    pub result: GameResult,
    pub notation: String,
}
