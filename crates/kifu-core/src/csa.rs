//! CSA move-notation tokenizer.
//!
//! A kifu arrives as one continuous string of fixed-width move tokens with no
//! separators, e.g. `"+7776FU-3334FU"`, optionally terminated by the literal
//! resignation marker `%TORYO`. Each token is a sign, a 4-digit square
//! transition (`00` as source means a drop from hand) and a 2-letter piece
//! code naming the piece as it stands after the move.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::KifuError;
use crate::piece::{kind_from_csa, Color, PieceKind};

/// Terminal resignation marker.
pub const RESIGN: &str = "%TORYO";

/// One parsed ply, keeping the raw token text for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsaMove {
    pub side: Color,
    /// Source square (file, rank); `None` for a drop from hand.
    pub from: Option<(u8, u8)>,
    /// Destination square (file, rank).
    pub to: (u8, u8),
    /// Piece kind as it stands after the move.
    pub kind: PieceKind,
    /// Whether the piece stands promoted after the move.
    pub promoted: bool,
    /// Raw 7-character token, e.g. `"+7776FU"`.
    pub text: String,
}

/// A tokenized kifu: the ordered move sequence plus the terminal marker.
#[derive(Debug, Clone)]
pub struct Kifu {
    pub moves: Vec<CsaMove>,
    pub resigned: bool,
}

/// Split a raw CSA move string into ordered move tokens.
///
/// Scanning is greedy left-to-right and non-overlapping; whatever remains
/// after removing every token must be empty or exactly [`RESIGN`]. An input
/// yielding no moves at all is rejected as well.
pub fn tokenize(notation: &str) -> Result<Kifu, KifuError> {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    let token_re = TOKEN_RE.get_or_init(|| Regex::new(r"[+-][0-9]{4}[A-Z]{2}").unwrap());

    let mut moves = Vec::new();
    for m in token_re.find_iter(notation) {
        moves.push(parse_token(m.as_str())?);
    }

    let residue = token_re.replace_all(notation, "");
    let resigned = residue == RESIGN;
    if !residue.is_empty() && !resigned {
        return Err(KifuError::MalformedNotation(format!(
            "unparsed residue {residue:?}"
        )));
    }
    if moves.is_empty() && !resigned {
        return Err(KifuError::MalformedNotation(
            "no moves in notation".to_string(),
        ));
    }

    Ok(Kifu { moves, resigned })
}

fn parse_token(token: &str) -> Result<CsaMove, KifuError> {
    let bytes = token.as_bytes();
    let side = match bytes[0] {
        b'+' => Color::Black,
        b'-' => Color::White,
        _ => unreachable!("sign guaranteed by the token pattern"),
    };
    let fx = bytes[1] - b'0';
    let fy = bytes[2] - b'0';
    let tx = bytes[3] - b'0';
    let ty = bytes[4] - b'0';

    let from = match (fx, fy) {
        (0, 0) => None,
        (1..=9, 1..=9) => Some((fx, fy)),
        _ => {
            return Err(KifuError::MalformedNotation(format!(
                "bad source square in token {token:?}"
            )))
        }
    };
    if !(1..=9).contains(&tx) || !(1..=9).contains(&ty) {
        return Err(KifuError::MalformedNotation(format!(
            "bad destination square in token {token:?}"
        )));
    }

    let (kind, promoted) = kind_from_csa(&token[5..7]).ok_or_else(|| {
        KifuError::MalformedNotation(format!("unknown piece code in token {token:?}"))
    })?;

    Ok(CsaMove {
        side,
        from,
        to: (tx, ty),
        kind,
        promoted,
        text: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_two_pawn_pushes() {
        let kifu = tokenize("+7776FU-3334FU").unwrap();
        assert_eq!(kifu.moves.len(), 2);
        assert!(!kifu.resigned);

        let first = &kifu.moves[0];
        assert_eq!(first.side, Color::Black);
        assert_eq!(first.from, Some((7, 7)));
        assert_eq!(first.to, (7, 6));
        assert_eq!(first.kind, PieceKind::Pawn);
        assert!(!first.promoted);
        assert_eq!(first.text, "+7776FU");
    }

    #[test]
    fn drop_source_is_none() {
        let kifu = tokenize("+0055KA").unwrap();
        assert_eq!(kifu.moves[0].from, None);
        assert_eq!(kifu.moves[0].to, (5, 5));
        assert_eq!(kifu.moves[0].kind, PieceKind::Bishop);
    }

    #[test]
    fn trailing_resignation_marker() {
        let kifu = tokenize("+7776FU-3334FU%TORYO").unwrap();
        assert_eq!(kifu.moves.len(), 2);
        assert!(kifu.resigned);
    }

    #[test]
    fn rejects_foreign_residue() {
        let err = tokenize("+7776FU-3334FUxyz").unwrap_err();
        assert!(matches!(err, KifuError::MalformedNotation(_)), "{err}");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(tokenize("").is_err());
        assert!(tokenize("garbage").is_err());
    }

    #[test]
    fn lone_resignation_is_accepted() {
        let kifu = tokenize("%TORYO").unwrap();
        assert!(kifu.moves.is_empty());
        assert!(kifu.resigned);
    }

    #[test]
    fn rejects_unknown_piece_code() {
        let err = tokenize("+7776XX").unwrap_err();
        assert!(matches!(err, KifuError::MalformedNotation(_)), "{err}");
    }

    #[test]
    fn rejects_half_zero_source() {
        let err = tokenize("+0776FU").unwrap_err();
        assert!(matches!(err, KifuError::MalformedNotation(_)), "{err}");
    }
}
