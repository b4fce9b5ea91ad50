//! Piece primitives: colors, piece kinds, CSA codes and movement patterns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn flip(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// CSA sign character for this side.
    pub fn sign(self) -> char {
        match self {
            Color::Black => '+',
            Color::White => '-',
        }
    }

    /// Vertical direction this side moves in (ranks count from White's camp).
    pub(crate) fn forward(self) -> i8 {
        match self {
            Color::Black => -1,
            Color::White => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Lance,
    Knight,
    Silver,
    Gold,
    Bishop,
    Rook,
    King,
}

impl PieceKind {
    pub fn promotable(self) -> bool {
        !matches!(self, PieceKind::Gold | PieceKind::King)
    }

    /// CSA code for the unpromoted kind.
    pub fn csa_code(self) -> &'static str {
        match self {
            PieceKind::Pawn => "FU",
            PieceKind::Lance => "KY",
            PieceKind::Knight => "KE",
            PieceKind::Silver => "GI",
            PieceKind::Gold => "KI",
            PieceKind::Bishop => "KA",
            PieceKind::Rook => "HI",
            PieceKind::King => "OU",
        }
    }

    /// SFEN letter for the unpromoted kind (lowercase).
    pub(crate) fn sfen_letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Lance => 'l',
            PieceKind::Knight => 'n',
            PieceKind::Silver => 's',
            PieceKind::Gold => 'g',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::King => 'k',
        }
    }
}

/// Decode a CSA piece code into (kind, promoted). `None` for unknown codes.
pub fn kind_from_csa(code: &str) -> Option<(PieceKind, bool)> {
    use PieceKind::*;
    let decoded = match code {
        "FU" => (Pawn, false),
        "KY" => (Lance, false),
        "KE" => (Knight, false),
        "GI" => (Silver, false),
        "KI" => (Gold, false),
        "KA" => (Bishop, false),
        "HI" => (Rook, false),
        "OU" => (King, false),
        "TO" => (Pawn, true),
        "NY" => (Lance, true),
        "NK" => (Knight, true),
        "NG" => (Silver, true),
        "UM" => (Bishop, true),
        "RY" => (Rook, true),
        _ => return None,
    };
    Some(decoded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub promoted: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color, promoted: bool) -> Self {
        Self {
            kind,
            color,
            promoted,
        }
    }

    /// CSA code as the piece currently stands (e.g. promoted pawn -> "TO").
    pub fn csa_code(&self) -> &'static str {
        if !self.promoted {
            return self.kind.csa_code();
        }
        match self.kind {
            PieceKind::Pawn => "TO",
            PieceKind::Lance => "NY",
            PieceKind::Knight => "NK",
            PieceKind::Silver => "NG",
            PieceKind::Bishop => "UM",
            PieceKind::Rook => "RY",
            // Gold and king never promote.
            PieceKind::Gold | PieceKind::King => self.kind.csa_code(),
        }
    }

    /// Movement pattern for this piece, relative to (file, rank) deltas.
    pub(crate) fn movement(&self) -> Vec<MoveStep> {
        use MoveStep::{Slide, Step};
        let f = self.color.forward();

        let gold = |f: i8| {
            vec![
                Step(-1, f),
                Step(0, f),
                Step(1, f),
                Step(-1, 0),
                Step(1, 0),
                Step(0, -f),
            ]
        };

        match (self.kind, self.promoted) {
            (PieceKind::Pawn, false) => vec![Step(0, f)],
            (PieceKind::Lance, false) => vec![Slide(0, f)],
            (PieceKind::Knight, false) => vec![Step(-1, 2 * f), Step(1, 2 * f)],
            (PieceKind::Silver, false) => vec![
                Step(-1, f),
                Step(0, f),
                Step(1, f),
                Step(-1, -f),
                Step(1, -f),
            ],
            (PieceKind::Gold, _)
            | (PieceKind::Pawn, true)
            | (PieceKind::Lance, true)
            | (PieceKind::Knight, true)
            | (PieceKind::Silver, true) => gold(f),
            (PieceKind::Bishop, false) => vec![
                Slide(-1, -1),
                Slide(-1, 1),
                Slide(1, -1),
                Slide(1, 1),
            ],
            (PieceKind::Bishop, true) => vec![
                Slide(-1, -1),
                Slide(-1, 1),
                Slide(1, -1),
                Slide(1, 1),
                Step(0, -1),
                Step(0, 1),
                Step(-1, 0),
                Step(1, 0),
            ],
            (PieceKind::Rook, false) => vec![
                Slide(0, -1),
                Slide(0, 1),
                Slide(-1, 0),
                Slide(1, 0),
            ],
            (PieceKind::Rook, true) => vec![
                Slide(0, -1),
                Slide(0, 1),
                Slide(-1, 0),
                Slide(1, 0),
                Step(-1, -1),
                Step(-1, 1),
                Step(1, -1),
                Step(1, 1),
            ],
            (PieceKind::King, _) => vec![
                Step(-1, -1),
                Step(0, -1),
                Step(1, -1),
                Step(-1, 0),
                Step(1, 0),
                Step(-1, 1),
                Step(0, 1),
                Step(1, 1),
            ],
        }
    }
}

/// One element of a movement pattern, as (file, rank) deltas.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MoveStep {
    /// Move exactly one square in the given direction.
    Step(i8, i8),
    /// Slide any distance in the given direction until blocked.
    Slide(i8, i8),
}
