//! Submission orchestration: trust check, handicap check, replay, game
//! persistence and graph upsert, with full rollback on any late failure.

use chrono::NaiveDate;
use kifu_core::{replay, Handicap, KifuError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::model::{GameId, GameResult, NewGame};
use crate::store::{GraphStore, GraphTxn, SourceDirectory};
use crate::upsert::apply_game;

/// One incoming kifu, as posted by a trusted provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KifuSubmission {
    pub source_pass: String,
    pub handicap_id: i16,
    pub black_name: String,
    pub white_name: String,
    pub played_on: Option<NaiveDate>,
    /// 0 = black win, 1 = white win, 2 = draw.
    pub result_code: i16,
    /// Continuous CSA move string.
    pub csa: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionOutcome {
    pub game_id: GameId,
    /// Number of positions the game passes through, initial included.
    pub positions: usize,
    pub moves: usize,
    pub resigned: bool,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no proper game source specified")]
    UnknownSource,

    #[error("no proper handicap specified: {0}")]
    UnknownHandicap(i16),

    #[error("unknown result code: {0}")]
    InvalidResult(i16),

    /// Malformed notation or an illegal move; nothing was persisted.
    #[error(transparent)]
    Kifu(#[from] KifuError),

    #[error("duplicate game submission")]
    Duplicate,

    /// Storage failure after validation; the submission was rolled back and
    /// may be retried.
    #[error("graph persistence error: {0}")]
    Persistence(#[source] StoreError),
}

impl SubmitError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Persistence(_))
    }

    fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateGame => SubmitError::Duplicate,
            other => SubmitError::Persistence(other),
        }
    }
}

/// Drives one submission end to end against the host's collaborators.
pub struct Submitter<S, D> {
    store: S,
    sources: D,
}

impl<S: GraphStore, D: SourceDirectory> Submitter<S, D> {
    pub fn new(store: S, sources: D) -> Self {
        Self { store, sources }
    }

    /// Validate and ingest one kifu. Every failure is scoped to this
    /// submission: the graph and game tables are left exactly as they were
    /// unless the whole ingestion succeeds.
    pub async fn submit(
        &self,
        submission: &KifuSubmission,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let source = self
            .sources
            .resolve_trusted_source(&submission.source_pass)
            .await
            .map_err(SubmitError::from_store)?
            .ok_or(SubmitError::UnknownSource)?;
        let handicap = Handicap::from_id(submission.handicap_id)
            .ok_or(SubmitError::UnknownHandicap(submission.handicap_id))?;
        let result = GameResult::from_code(submission.result_code)
            .ok_or(SubmitError::InvalidResult(submission.result_code))?;

        let replayed = replay(handicap, &submission.csa)?;

        let game = NewGame {
            source: source.id,
            black_name: submission.black_name.clone(),
            white_name: submission.white_name.clone(),
            played_on: submission.played_on,
            handicap,
            result,
            notation: submission.csa.clone(),
        };
        // Duplicates abort here, before any graph mutation.
        let game_id = self
            .store
            .save_game(&game)
            .await
            .map_err(SubmitError::from_store)?;

        let upserted = async {
            let mut txn = self.store.begin().await?;
            match apply_game(
                &mut txn,
                game_id,
                &replayed.snapshots,
                &replayed.moves,
                handicap,
                source.stats_category(),
                result,
            )
            .await
            {
                Ok(()) => txn.commit().await,
                Err(err) => {
                    if let Err(rb) = txn.rollback().await {
                        warn!(game_id, error = %rb, "transaction rollback failed");
                    }
                    Err(err)
                }
            }
        }
        .await;

        if let Err(err) = upserted {
            warn!(game_id, error = %err, "submission failed, rolling back game record");
            if let Err(del) = self.store.delete_game(game_id).await {
                warn!(game_id, error = %del, "failed to delete game record after rollback");
            }
            return Err(SubmitError::from_store(err));
        }

        let outcome = SubmissionOutcome {
            game_id,
            positions: replayed.snapshots.len(),
            moves: replayed.moves.len(),
            resigned: replayed.resigned,
        };
        info!(
            game_id,
            source = %source.name,
            handicap = handicap.name(),
            positions = outcome.positions,
            moves = outcome.moves,
            resigned = outcome.resigned,
            "kifu ingested"
        );
        Ok(outcome)
    }
}
