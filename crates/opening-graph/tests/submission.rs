//! End-to-end submission tests against the in-memory store: deduplication,
//! statistics, rollback atomicity and concurrent convergence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kifu_core::{replay, Handicap};
use opening_graph::memory::{category_index, GraphData, MemoryTxn};
use opening_graph::{
    GameId, GameResult, GameSource, GraphStore, GraphTxn, KifuSubmission, MemoryGraphStore,
    MemorySourceDirectory, MoveId, NewGame, PositionId, SourceCategory, StoreError, SubmitError,
    Submitter,
};

const PRO_PASS: &str = "pro-pass";
const DOJO_PASS: &str = "dojo-pass";

fn directory() -> MemorySourceDirectory {
    let mut dir = MemorySourceDirectory::new();
    dir.register(
        PRO_PASS,
        GameSource {
            id: 1,
            name: "Meijin archive".to_string(),
            category_code: 1,
            kifu_url_header: None,
        },
    );
    dir.register(
        DOJO_PASS,
        GameSource {
            id: 2,
            name: "81Dojo".to_string(),
            category_code: 2,
            kifu_url_header: Some("http://81dojo.com/kifuviewer_jp.html?kid=".to_string()),
        },
    );
    dir
}

fn submission(pass: &str, black: &str, csa: &str) -> KifuSubmission {
    KifuSubmission {
        source_pass: pass.to_string(),
        handicap_id: 1,
        black_name: black.to_string(),
        white_name: "gote".to_string(),
        played_on: None,
        result_code: 0,
        csa: csa.to_string(),
    }
}

fn fingerprint_after(csa: &str) -> String {
    replay(Handicap::Even, csa)
        .unwrap()
        .snapshots
        .last()
        .unwrap()
        .fingerprint
        .clone()
}

#[tokio::test]
async fn happy_path_populates_the_graph() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    let outcome = submitter
        .submit(&submission(PRO_PASS, "sente", "+7776FU-3334FU"))
        .await
        .unwrap();
    assert_eq!(outcome.positions, 3);
    assert_eq!(outcome.moves, 2);
    assert!(!outcome.resigned);

    let data = store.dump().await;
    assert_eq!(data.positions.len(), 3);
    assert_eq!(data.moves.len(), 2);
    assert_eq!(data.games.len(), 1);
    assert_eq!(data.links_of(outcome.game_id).len(), 3);

    let pro = category_index(SourceCategory::Professional);
    for position in &data.positions {
        assert_eq!(position.stats[pro].black_wins, 1);
        assert_eq!(position.stats[pro].white_wins, 0);
    }
    for edge in &data.moves {
        assert_eq!(edge.totals[pro], 1);
    }
    // Edge notation comes from the traversed token.
    let start = data.position(&start_fingerprint()).unwrap();
    let after_first = data.position(&fingerprint_after("+7776FU")).unwrap();
    let edge = data.edge(start.id, after_first.id).unwrap();
    assert_eq!(edge.notation, "+7776FU");
}

fn start_fingerprint() -> String {
    replay(Handicap::Even, "%TORYO")
        .unwrap()
        .snapshots
        .remove(0)
        .fingerprint
}

#[tokio::test]
async fn transpositions_resolve_to_one_node() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    submitter
        .submit(&submission(PRO_PASS, "a", "+2726FU-3334FU+7776FU-8384FU"))
        .await
        .unwrap();
    submitter
        .submit(&submission(PRO_PASS, "b", "+7776FU-8384FU+2726FU-3334FU"))
        .await
        .unwrap();

    let data = store.dump().await;
    // Initial and final positions are shared, the intermediates are not.
    assert_eq!(data.positions.len(), 8);

    let shared = data
        .position(&fingerprint_after("+2726FU-3334FU+7776FU-8384FU"))
        .unwrap();
    let pro = category_index(SourceCategory::Professional);
    assert_eq!(shared.stats[pro].black_wins, 2);
}

#[tokio::test]
async fn repeated_position_counts_once_per_game() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    // Both rooks shuffle out and back: the final position repeats the first.
    let outcome = submitter
        .submit(&submission(PRO_PASS, "sente", "+2838HI-8272HI+3828HI-7282HI"))
        .await
        .unwrap();
    assert_eq!(outcome.positions, 5);

    let data = store.dump().await;
    assert_eq!(data.positions.len(), 4);
    assert_eq!(data.moves.len(), 4);

    let pro = category_index(SourceCategory::Professional);
    let start = data.position(&start_fingerprint()).unwrap();
    assert_eq!(start.stats[pro].black_wins, 1);
    // The repeated node is linked to the game exactly once.
    assert_eq!(data.links_of(outcome.game_id).len(), 4);
}

#[tokio::test]
async fn edges_are_unique_per_ordered_pair() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    submitter
        .submit(&submission(PRO_PASS, "a", "+7776FU-3334FU"))
        .await
        .unwrap();
    submitter
        .submit(&submission(DOJO_PASS, "b", "+7776FU-3334FU"))
        .await
        .unwrap();

    let data = store.dump().await;
    assert_eq!(data.moves.len(), 2);
    for edge in &data.moves {
        assert_eq!(edge.totals[category_index(SourceCategory::Professional)], 1);
        assert_eq!(edge.totals[category_index(SourceCategory::AmateurOnline)], 1);
    }
}

#[tokio::test]
async fn duplicate_submission_is_rejected_without_side_effects() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());
    let sub = submission(PRO_PASS, "sente", "+7776FU-3334FU");

    submitter.submit(&sub).await.unwrap();
    let err = submitter.submit(&sub).await.unwrap_err();
    assert!(matches!(err, SubmitError::Duplicate), "{err}");

    let data = store.dump().await;
    assert_eq!(data.games.len(), 1);
    let pro = category_index(SourceCategory::Professional);
    let start = data.position(&start_fingerprint()).unwrap();
    assert_eq!(start.stats[pro].black_wins, 1);
}

#[tokio::test]
async fn invalid_submissions_leave_no_trace() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    let err = submitter
        .submit(&submission("wrong-pass", "a", "+7776FU"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::UnknownSource), "{err}");

    let mut bad_handicap = submission(PRO_PASS, "a", "+7776FU");
    bad_handicap.handicap_id = 42;
    let err = submitter.submit(&bad_handicap).await.unwrap_err();
    assert!(matches!(err, SubmitError::UnknownHandicap(42)), "{err}");

    let err = submitter
        .submit(&submission(PRO_PASS, "a", "+7776FU-3334FUxyz"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Kifu(_)), "{err}");

    // Illegal second move: White cannot move twice.
    let err = submitter
        .submit(&submission(PRO_PASS, "a", "+7776FU-3334FU-8384FU"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Kifu(_)), "{err}");

    let data = store.dump().await;
    assert!(data.games.is_empty());
    assert!(data.positions.is_empty());
    assert!(data.moves.is_empty());
}

#[tokio::test]
async fn resignation_marker_terminates_cleanly() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    let outcome = submitter
        .submit(&submission(PRO_PASS, "sente", "+7776FU-3334FU%TORYO"))
        .await
        .unwrap();
    assert!(outcome.resigned);
    assert_eq!(outcome.positions, 3);
    assert_eq!(store.dump().await.positions.len(), 3);
}

#[tokio::test]
async fn unrecognized_category_skips_statistics() {
    let store = MemoryGraphStore::new();
    let mut dir = directory();
    dir.register(
        "oddball",
        GameSource {
            id: 9,
            name: "Unclassified feed".to_string(),
            category_code: 7,
            kifu_url_header: None,
        },
    );
    let submitter = Submitter::new(store.clone(), dir);

    let outcome = submitter
        .submit(&submission("oddball", "sente", "+7776FU-3334FU"))
        .await
        .unwrap();

    let data = store.dump().await;
    assert_eq!(data.positions.len(), 3);
    assert_eq!(data.links_of(outcome.game_id).len(), 3);
    for position in &data.positions {
        assert_eq!(position.stats, [Default::default(); 2]);
    }
    for edge in &data.moves {
        assert_eq!(edge.totals, [0; 2]);
    }
}

#[tokio::test]
async fn opening_classification_propagates_first_wins() {
    let store = MemoryGraphStore::new();
    let submitter = Submitter::new(store.clone(), directory());

    submitter
        .submit(&submission(PRO_PASS, "a", "+7776FU"))
        .await
        .unwrap();

    // Tag the starting position, as the opening seeder would.
    let start_id = store.dump().await.position(&start_fingerprint()).unwrap().id;
    let mut txn = store.begin().await.unwrap();
    txn.set_opening_if_empty(start_id, "相居飛車").await.unwrap();
    txn.commit().await.unwrap();

    submitter
        .submit(&submission(PRO_PASS, "b", "+7776FU-3334FU"))
        .await
        .unwrap();

    let data = store.dump().await;
    let mid = data.position(&fingerprint_after("+7776FU")).unwrap();
    let end = data.position(&fingerprint_after("+7776FU-3334FU")).unwrap();
    assert_eq!(mid.opening.as_deref(), Some("相居飛車"));
    assert_eq!(end.opening.as_deref(), Some("相居飛車"));

    // A later write never overrides an existing classification.
    let mut txn = store.begin().await.unwrap();
    txn.set_opening_if_empty(mid.id, "振り飛車").await.unwrap();
    txn.commit().await.unwrap();
    let data = store.dump().await;
    assert_eq!(
        data.position(&fingerprint_after("+7776FU")).unwrap().opening.as_deref(),
        Some("相居飛車")
    );
}

#[tokio::test]
async fn concurrent_first_encounters_converge_on_one_node() {
    let store = MemoryGraphStore::new();
    let dir = directory();

    let mut handles = Vec::new();
    for name in ["sente-a", "sente-b"] {
        let submitter = Submitter::new(store.clone(), dir.clone());
        let sub = submission(PRO_PASS, name, "+7776FU-3334FU");
        handles.push(tokio::spawn(async move { submitter.submit(&sub).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let data = store.dump().await;
    assert_eq!(data.positions.len(), 3);
    assert_eq!(data.games.len(), 2);
    assert_eq!(data.appearances.len(), 6);
    let pro = category_index(SourceCategory::Professional);
    let start = data.position(&start_fingerprint()).unwrap();
    assert_eq!(start.stats[pro].black_wins, 2);
}

// ---------------------------------------------------------------------------
// Rollback atomicity with an injected storage failure
// ---------------------------------------------------------------------------

/// Wraps the memory store and fails the nth transactional operation,
/// optionally failing the rollback that follows as well.
#[derive(Clone)]
struct FailingStore {
    inner: MemoryGraphStore,
    remaining_ops: Arc<AtomicUsize>,
    fail_rollback: bool,
}

struct FailingTxn {
    inner: MemoryTxn,
    remaining_ops: Arc<AtomicUsize>,
    fail_rollback: bool,
}

impl FailingTxn {
    fn charge(&self) -> Result<(), StoreError> {
        let before = self.remaining_ops.fetch_sub(1, Ordering::SeqCst);
        if before == 0 {
            return Err(StoreError::Backend(anyhow::anyhow!("injected failure")));
        }
        Ok(())
    }
}

impl GraphStore for FailingStore {
    type Txn = FailingTxn;

    async fn begin(&self) -> Result<FailingTxn, StoreError> {
        Ok(FailingTxn {
            inner: self.inner.begin().await?,
            remaining_ops: self.remaining_ops.clone(),
            fail_rollback: self.fail_rollback,
        })
    }

    async fn save_game(&self, game: &NewGame) -> Result<GameId, StoreError> {
        self.inner.save_game(game).await
    }

    async fn delete_game(&self, id: GameId) -> Result<(), StoreError> {
        self.inner.delete_game(id).await
    }
}

impl GraphTxn for FailingTxn {
    async fn find_or_create_position(
        &mut self,
        fingerprint: &str,
        display: &str,
        handicap: Handicap,
    ) -> Result<opening_graph::PositionNode, StoreError> {
        self.charge()?;
        self.inner
            .find_or_create_position(fingerprint, display, handicap)
            .await
    }

    async fn find_or_create_move(
        &mut self,
        from: PositionId,
        to: PositionId,
        notation: &str,
    ) -> Result<opening_graph::MoveEdge, StoreError> {
        self.charge()?;
        self.inner.find_or_create_move(from, to, notation).await
    }

    async fn bump_position_result(
        &mut self,
        id: PositionId,
        category: SourceCategory,
        result: GameResult,
    ) -> Result<(), StoreError> {
        self.charge()?;
        self.inner.bump_position_result(id, category, result).await
    }

    async fn bump_move_total(
        &mut self,
        id: MoveId,
        category: SourceCategory,
    ) -> Result<(), StoreError> {
        self.charge()?;
        self.inner.bump_move_total(id, category).await
    }

    async fn set_opening_if_empty(
        &mut self,
        id: PositionId,
        opening: &str,
    ) -> Result<(), StoreError> {
        self.charge()?;
        self.inner.set_opening_if_empty(id, opening).await
    }

    async fn link_game(
        &mut self,
        game: GameId,
        position: PositionId,
        ply: usize,
        next_move: Option<MoveId>,
    ) -> Result<(), StoreError> {
        self.charge()?;
        self.inner.link_game(game, position, ply, next_move).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), StoreError> {
        if self.fail_rollback {
            // The inner transaction is dropped instead, which still rolls
            // its changes back.
            return Err(StoreError::Backend(anyhow::anyhow!("rollback refused")));
        }
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn mid_upsert_failure_rolls_back_everything() {
    let memory = MemoryGraphStore::new();
    let store = FailingStore {
        inner: memory.clone(),
        // Enough operations to create the positions, then fail on an edge.
        remaining_ops: Arc::new(AtomicUsize::new(4)),
        fail_rollback: false,
    };
    let submitter = Submitter::new(store, directory());

    let err = submitter
        .submit(&submission(PRO_PASS, "sente", "+7776FU-3334FU"))
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "{err}");
    assert!(matches!(err, SubmitError::Persistence(_)), "{err}");

    let data: GraphData = memory.dump().await;
    assert!(data.games.is_empty());
    assert!(data.positions.is_empty());
    assert!(data.moves.is_empty());
    assert!(data.appearances.is_empty());
}

#[tokio::test]
async fn failed_rollback_still_surfaces_the_original_error() {
    let memory = MemoryGraphStore::new();
    let store = FailingStore {
        inner: memory.clone(),
        remaining_ops: Arc::new(AtomicUsize::new(4)),
        fail_rollback: true,
    };
    let submitter = Submitter::new(store, directory());

    // The upsert failure wins over the rollback failure.
    let err = submitter
        .submit(&submission(PRO_PASS, "sente", "+7776FU-3334FU"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Persistence(_)), "{err}");

    let data = memory.dump().await;
    assert!(data.games.is_empty());
    assert!(data.positions.is_empty());
}
