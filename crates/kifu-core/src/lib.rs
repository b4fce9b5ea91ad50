//! Pure shogi domain logic for kifu ingestion: CSA tokenization, handicap
//! starting configurations, a rule-aware board engine, canonical position
//! fingerprints and replay of full games.

pub mod board;
pub mod csa;
pub mod error;
pub mod handicap;
pub mod piece;
pub mod replay;

pub use board::Board;
pub use csa::{tokenize, CsaMove, Kifu, RESIGN};
pub use error::KifuError;
pub use handicap::Handicap;
pub use piece::{Color, Piece, PieceKind};
pub use replay::{replay, PositionSnapshot, Replay};
