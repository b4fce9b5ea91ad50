use thiserror::Error;

/// Validation failures while parsing or replaying a kifu. Both are scoped to
/// one submission and never fatal to the caller.
#[derive(Debug, Error)]
pub enum KifuError {
    /// The notation string could not be fully consumed by the CSA grammar.
    #[error("malformed notation: {0}")]
    MalformedNotation(String),

    /// A parsed token could not be applied to the current board state.
    #[error("illegal move {token}: {reason}")]
    IllegalMove { token: String, reason: String },
}

impl KifuError {
    pub(crate) fn illegal(token: &str, reason: impl Into<String>) -> Self {
        KifuError::IllegalMove {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}
