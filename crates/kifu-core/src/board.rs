//! Rule-aware 9x9 board: move application, legality checking, canonical
//! fingerprints and CSA display rendering.
//!
//! The board validates supplied CSA moves; it does not generate moves. A
//! fingerprint is an SFEN-style encoding of placement, side to move and both
//! hands with the move counter deliberately omitted, so transpositions and
//! repetitions collapse to the same key.

use std::fmt::Write as _;

use crate::csa::CsaMove;
use crate::error::KifuError;
use crate::handicap::Handicap;
use crate::piece::{Color, MoveStep, Piece, PieceKind};

/// Captured-piece reserve for one side. Pieces are stored demoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hand {
    pawn: u8,
    lance: u8,
    knight: u8,
    silver: u8,
    gold: u8,
    bishop: u8,
    rook: u8,
}

/// Hand ordering used by SFEN and the CSA display, most valuable first.
const HAND_ORDER: [PieceKind; 7] = [
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Gold,
    PieceKind::Silver,
    PieceKind::Knight,
    PieceKind::Lance,
    PieceKind::Pawn,
];

impl Hand {
    pub fn count(&self, kind: PieceKind) -> u8 {
        match kind {
            PieceKind::Pawn => self.pawn,
            PieceKind::Lance => self.lance,
            PieceKind::Knight => self.knight,
            PieceKind::Silver => self.silver,
            PieceKind::Gold => self.gold,
            PieceKind::Bishop => self.bishop,
            PieceKind::Rook => self.rook,
            PieceKind::King => 0,
        }
    }

    fn slot(&mut self, kind: PieceKind) -> Option<&mut u8> {
        match kind {
            PieceKind::Pawn => Some(&mut self.pawn),
            PieceKind::Lance => Some(&mut self.lance),
            PieceKind::Knight => Some(&mut self.knight),
            PieceKind::Silver => Some(&mut self.silver),
            PieceKind::Gold => Some(&mut self.gold),
            PieceKind::Bishop => Some(&mut self.bishop),
            PieceKind::Rook => Some(&mut self.rook),
            PieceKind::King => None,
        }
    }

    /// Add a captured piece, demoted.
    fn add(&mut self, kind: PieceKind) {
        if let Some(slot) = self.slot(kind) {
            *slot += 1;
        }
    }

    /// Remove one piece for a drop. Returns false when none is available.
    fn take(&mut self, kind: PieceKind) -> bool {
        match self.slot(kind) {
            Some(slot) if *slot > 0 => {
                *slot -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        HAND_ORDER.iter().all(|&k| self.count(k) == 0)
    }
}

/// Mutable board state reached by `Board::new(handicap)` followed by
/// `apply(..)` per token.
#[derive(Debug, Clone)]
pub struct Board {
    /// squares[rank][file], both 1-based; rank 1 is White's back rank and
    /// file 1 the rightmost file from Black's seat.
    squares: [[Option<Piece>; 10]; 10],
    hands: [Hand; 2],
    side: Color,
}

const BACK_RANK: [PieceKind; 9] = [
    PieceKind::Lance,
    PieceKind::Knight,
    PieceKind::Silver,
    PieceKind::Gold,
    PieceKind::King,
    PieceKind::Gold,
    PieceKind::Silver,
    PieceKind::Knight,
    PieceKind::Lance,
];

fn hand_index(color: Color) -> usize {
    match color {
        Color::Black => 0,
        Color::White => 1,
    }
}

impl Board {
    /// Set up the fixed starting placement for the given handicap variant.
    pub fn new(handicap: Handicap) -> Self {
        let mut squares = [[None; 10]; 10];
        for x in 1..=9u8 {
            let kind = BACK_RANK[x as usize - 1];
            squares[1][x as usize] = Some(Piece::new(kind, Color::White, false));
            squares[9][x as usize] = Some(Piece::new(kind, Color::Black, false));
            squares[3][x as usize] = Some(Piece::new(PieceKind::Pawn, Color::White, false));
            squares[7][x as usize] = Some(Piece::new(PieceKind::Pawn, Color::Black, false));
        }
        squares[2][8] = Some(Piece::new(PieceKind::Rook, Color::White, false));
        squares[2][2] = Some(Piece::new(PieceKind::Bishop, Color::White, false));
        squares[8][2] = Some(Piece::new(PieceKind::Rook, Color::Black, false));
        squares[8][8] = Some(Piece::new(PieceKind::Bishop, Color::Black, false));

        for &(x, y) in handicap.removed_white_squares() {
            squares[y as usize][x as usize] = None;
        }

        Self {
            squares,
            hands: [Hand::default(), Hand::default()],
            side: handicap.first_to_move(),
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.side
    }

    pub fn hand(&self, color: Color) -> &Hand {
        &self.hands[hand_index(color)]
    }

    fn at(&self, sq: (u8, u8)) -> Option<Piece> {
        self.squares[sq.1 as usize][sq.0 as usize]
    }

    /// Apply one parsed move. On error the board is left untouched and the
    /// failure is a recoverable validation error, never a panic.
    pub fn apply(&mut self, mv: &CsaMove) -> Result<(), KifuError> {
        let mut next = self.clone();
        next.apply_inner(mv)?;
        if next.king_attacked(mv.side) {
            return Err(KifuError::illegal(&mv.text, "leaves own king in check"));
        }
        *self = next;
        Ok(())
    }

    fn apply_inner(&mut self, mv: &CsaMove) -> Result<(), KifuError> {
        if mv.side != self.side {
            return Err(KifuError::illegal(&mv.text, "wrong side to move"));
        }

        match mv.from {
            None => self.apply_drop(mv)?,
            Some(from) => self.apply_board_move(mv, from)?,
        }

        self.side = self.side.flip();
        Ok(())
    }

    fn apply_drop(&mut self, mv: &CsaMove) -> Result<(), KifuError> {
        if mv.promoted {
            return Err(KifuError::illegal(&mv.text, "cannot drop a promoted piece"));
        }
        if mv.kind == PieceKind::King {
            return Err(KifuError::illegal(&mv.text, "cannot drop a king"));
        }
        if self.at(mv.to).is_some() {
            return Err(KifuError::illegal(&mv.text, "destination is occupied"));
        }
        if !piece_can_move_from(mv.kind, mv.side, mv.to.1) {
            return Err(KifuError::illegal(
                &mv.text,
                "piece would have no further moves on that rank",
            ));
        }
        if mv.kind == PieceKind::Pawn && self.has_unpromoted_pawn_on_file(mv.side, mv.to.0) {
            return Err(KifuError::illegal(&mv.text, "two pawns on one file"));
        }
        if !self.hands[hand_index(mv.side)].take(mv.kind) {
            return Err(KifuError::illegal(&mv.text, "piece not in hand"));
        }

        self.squares[mv.to.1 as usize][mv.to.0 as usize] =
            Some(Piece::new(mv.kind, mv.side, false));
        Ok(())
    }

    fn apply_board_move(&mut self, mv: &CsaMove, from: (u8, u8)) -> Result<(), KifuError> {
        let src = self
            .at(from)
            .ok_or_else(|| KifuError::illegal(&mv.text, "no piece on source square"))?;
        if src.color != mv.side {
            return Err(KifuError::illegal(
                &mv.text,
                "source piece belongs to the opponent",
            ));
        }

        // The token names the piece as it stands after the move; a code one
        // promotion step above the source piece is a promoting move.
        let promoting = if src.kind == mv.kind && src.promoted == mv.promoted {
            false
        } else if src.kind == mv.kind && !src.promoted && mv.promoted {
            true
        } else {
            return Err(KifuError::illegal(
                &mv.text,
                "piece code does not match the source piece",
            ));
        };
        if promoting && !in_promotion_zone(mv.side, from.1) && !in_promotion_zone(mv.side, mv.to.1)
        {
            return Err(KifuError::illegal(&mv.text, "promotion outside the zone"));
        }

        if let Some(dst) = self.at(mv.to) {
            if dst.color == mv.side {
                return Err(KifuError::illegal(&mv.text, "destination holds own piece"));
            }
            if dst.kind == PieceKind::King {
                return Err(KifuError::illegal(&mv.text, "cannot capture the king"));
            }
        }

        if !self.reachable(src, from, mv.to) {
            return Err(KifuError::illegal(
                &mv.text,
                "destination not reachable by that piece",
            ));
        }
        if !mv.promoted && !piece_can_move_from(mv.kind, mv.side, mv.to.1) {
            return Err(KifuError::illegal(
                &mv.text,
                "piece would have no further moves on that rank",
            ));
        }

        if let Some(dst) = self.at(mv.to) {
            self.hands[hand_index(mv.side)].add(dst.kind);
        }
        self.squares[from.1 as usize][from.0 as usize] = None;
        self.squares[mv.to.1 as usize][mv.to.0 as usize] =
            Some(Piece::new(mv.kind, mv.side, mv.promoted));
        Ok(())
    }

    /// Whether `piece`, standing on `from`, can reach `to` under its movement
    /// pattern, with every intermediate square of a sliding path empty. The
    /// destination square itself may be occupied.
    fn reachable(&self, piece: Piece, from: (u8, u8), to: (u8, u8)) -> bool {
        for step in piece.movement() {
            match step {
                MoveStep::Step(dx, dy) => {
                    if offset(from, dx, dy) == Some(to) {
                        return true;
                    }
                }
                MoveStep::Slide(dx, dy) => {
                    let mut sq = offset(from, dx, dy);
                    while let Some(cur) = sq {
                        if cur == to {
                            return true;
                        }
                        if self.at(cur).is_some() {
                            break;
                        }
                        sq = offset(cur, dx, dy);
                    }
                }
            }
        }
        false
    }

    fn has_unpromoted_pawn_on_file(&self, color: Color, file: u8) -> bool {
        (1..=9).any(|rank| {
            self.at((file, rank))
                .is_some_and(|p| p.kind == PieceKind::Pawn && !p.promoted && p.color == color)
        })
    }

    fn king_square(&self, color: Color) -> Option<(u8, u8)> {
        for y in 1..=9u8 {
            for x in 1..=9u8 {
                if self
                    .at((x, y))
                    .is_some_and(|p| p.kind == PieceKind::King && p.color == color)
                {
                    return Some((x, y));
                }
            }
        }
        None
    }

    fn king_attacked(&self, color: Color) -> bool {
        let Some(king) = self.king_square(color) else {
            return false;
        };
        let attacker = color.flip();
        for y in 1..=9u8 {
            for x in 1..=9u8 {
                if let Some(p) = self.at((x, y)) {
                    if p.color == attacker && self.reachable(p, (x, y), king) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Canonical position-equality encoding: SFEN board, side to move and
    /// hands, without a move counter.
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for y in 1..=9usize {
            let mut empty = 0u8;
            for x in (1..=9usize).rev() {
                match self.squares[y][x] {
                    Some(p) => {
                        if empty > 0 {
                            write!(out, "{empty}").unwrap();
                            empty = 0;
                        }
                        if p.promoted {
                            out.push('+');
                        }
                        let letter = p.kind.sfen_letter();
                        out.push(match p.color {
                            Color::Black => letter.to_ascii_uppercase(),
                            Color::White => letter,
                        });
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(out, "{empty}").unwrap();
            }
            if y != 9 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side {
            Color::Black => 'b',
            Color::White => 'w',
        });
        out.push(' ');

        let mut hands = String::new();
        for (color, hand) in [(Color::Black, self.hand(Color::Black)), (Color::White, self.hand(Color::White))] {
            for kind in HAND_ORDER {
                let n = hand.count(kind);
                if n == 0 {
                    continue;
                }
                if n > 1 {
                    write!(hands, "{n}").unwrap();
                }
                let letter = kind.sfen_letter();
                hands.push(match color {
                    Color::Black => letter.to_ascii_uppercase(),
                    Color::White => letter,
                });
            }
        }
        if hands.is_empty() {
            out.push('-');
        } else {
            out.push_str(&hands);
        }
        out
    }

    /// Human-oriented CSA position diagram: `P1`..`P9` board rows, `P+`/`P-`
    /// hand lines and a trailing side-to-move sign. Descriptive only.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for y in 1..=9usize {
            write!(out, "P{y}").unwrap();
            for x in (1..=9usize).rev() {
                match self.squares[y][x] {
                    Some(p) => {
                        out.push(p.color.sign());
                        out.push_str(p.csa_code());
                    }
                    None => out.push_str(" * "),
                }
            }
            out.push('\n');
        }
        for (line, color) in [("P+", Color::Black), ("P-", Color::White)] {
            out.push_str(line);
            let hand = self.hand(color);
            for kind in HAND_ORDER {
                for _ in 0..hand.count(kind) {
                    out.push_str("00");
                    out.push_str(kind.csa_code());
                }
            }
            out.push('\n');
        }
        out.push(self.side.sign());
        out.push('\n');
        out
    }
}

fn offset(sq: (u8, u8), dx: i8, dy: i8) -> Option<(u8, u8)> {
    let x = sq.0 as i8 + dx;
    let y = sq.1 as i8 + dy;
    if (1..=9).contains(&x) && (1..=9).contains(&y) {
        Some((x as u8, y as u8))
    } else {
        None
    }
}

fn in_promotion_zone(color: Color, rank: u8) -> bool {
    match color {
        Color::Black => rank <= 3,
        Color::White => rank >= 7,
    }
}

/// Whether an unpromoted piece of `kind` still has a legal move when standing
/// on `rank`. Pawns and lances dead-end on the last rank, knights on the last
/// two.
fn piece_can_move_from(kind: PieceKind, color: Color, rank: u8) -> bool {
    match kind {
        PieceKind::Pawn | PieceKind::Lance => match color {
            Color::Black => rank >= 2,
            Color::White => rank <= 8,
        },
        PieceKind::Knight => match color {
            Color::Black => rank >= 3,
            Color::White => rank <= 7,
        },
        _ => true,
    }
}
