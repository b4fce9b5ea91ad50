use thiserror::Error;

/// Failures surfaced by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A game with the same canonical identity is already stored.
    #[error("duplicate game submission")]
    DuplicateGame,

    /// Any other backend failure; retryable from the submitter's view.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
