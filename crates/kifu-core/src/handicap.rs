//! Handicap starting configurations.
//!
//! Kifu submissions identify the handicap by the numeric id used on the wire
//! (1 = even game, 2..=9 the fixed piece-deficit variants). Handicap variants
//! remove pieces from White's camp, and White moves first in all of them.

use serde::{Deserialize, Serialize};

use crate::piece::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handicap {
    Even,
    Lance,
    Bishop,
    Rook,
    RookLance,
    TwoPiece,
    FourPiece,
    SixPiece,
    EightPiece,
}

impl Handicap {
    pub fn from_id(id: i16) -> Option<Self> {
        let handicap = match id {
            1 => Handicap::Even,
            2 => Handicap::Lance,
            3 => Handicap::Bishop,
            4 => Handicap::Rook,
            5 => Handicap::RookLance,
            6 => Handicap::TwoPiece,
            7 => Handicap::FourPiece,
            8 => Handicap::SixPiece,
            9 => Handicap::EightPiece,
            _ => return None,
        };
        Some(handicap)
    }

    pub fn id(self) -> i16 {
        match self {
            Handicap::Even => 1,
            Handicap::Lance => 2,
            Handicap::Bishop => 3,
            Handicap::Rook => 4,
            Handicap::RookLance => 5,
            Handicap::TwoPiece => 6,
            Handicap::FourPiece => 7,
            Handicap::SixPiece => 8,
            Handicap::EightPiece => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handicap::Even => "平手",
            Handicap::Lance => "香落ち",
            Handicap::Bishop => "角落ち",
            Handicap::Rook => "飛車落ち",
            Handicap::RookLance => "飛香落ち",
            Handicap::TwoPiece => "二枚落ち",
            Handicap::FourPiece => "四枚落ち",
            Handicap::SixPiece => "六枚落ち",
            Handicap::EightPiece => "八枚落ち",
        }
    }

    /// The handicap receiver moves second, so every variant except the even
    /// game starts with White to move.
    pub fn first_to_move(self) -> Color {
        match self {
            Handicap::Even => Color::Black,
            _ => Color::White,
        }
    }

    /// Squares (file, rank) cleared from White's camp before play begins.
    pub(crate) fn removed_white_squares(self) -> &'static [(u8, u8)] {
        match self {
            Handicap::Even => &[],
            Handicap::Lance => &[(1, 1)],
            Handicap::Bishop => &[(2, 2)],
            Handicap::Rook => &[(8, 2)],
            Handicap::RookLance => &[(8, 2), (1, 1)],
            Handicap::TwoPiece => &[(8, 2), (2, 2)],
            Handicap::FourPiece => &[(8, 2), (2, 2), (1, 1), (9, 1)],
            Handicap::SixPiece => &[(8, 2), (2, 2), (1, 1), (9, 1), (2, 1), (8, 1)],
            Handicap::EightPiece => &[
                (8, 2),
                (2, 2),
                (1, 1),
                (9, 1),
                (2, 1),
                (8, 1),
                (3, 1),
                (7, 1),
            ],
        }
    }
}
