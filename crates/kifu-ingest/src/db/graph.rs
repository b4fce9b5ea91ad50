//! PostgreSQL-backed opening graph.
//!
//! Find-or-create races are settled by the unique constraints: an upsert with
//! `ON CONFLICT .. DO UPDATE` always returns the surviving row, whichever
//! submission inserted it.

use opening_graph::{
    GameId, GameResult, GraphStore, GraphTxn, MoveEdge, MoveId, NewGame, PositionId, PositionNode,
    SourceCategory, StoreError,
};

use kifu_core::Handicap;
use sqlx::{PgPool, Postgres, Transaction};

use super::backend;

#[derive(Clone)]
pub struct PgGraphStore {
    pool: PgPool,
}

impl PgGraphStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgGraphTxn {
    txn: Transaction<'static, Postgres>,
}

impl GraphStore for PgGraphStore {
    type Txn = PgGraphTxn;

    async fn begin(&self) -> Result<PgGraphTxn, StoreError> {
        let txn = self.pool.begin().await.map_err(backend)?;
        Ok(PgGraphTxn { txn })
    }

    async fn save_game(&self, game: &NewGame) -> Result<GameId, StoreError> {
        // The conflict target mirrors games_identity_idx; a dateless game
        // collides with other dateless games rather than with nothing.
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO games
                (game_source_id, black_name, white_name, played_on, handicap_id, result, csa)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (game_source_id, black_name, white_name,
                         COALESCE(played_on, DATE '0001-01-01'), md5(csa))
            DO NOTHING
            RETURNING id
            "#,
        )
        .bind(game.source)
        .bind(&game.black_name)
        .bind(&game.white_name)
        .bind(game.played_on)
        .bind(game.handicap.id())
        .bind(game.result.code())
        .bind(&game.notation)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some((id,)) => Ok(id),
            None => Err(StoreError::DuplicateGame),
        }
    }

    async fn delete_game(&self, id: GameId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

impl GraphTxn for PgGraphTxn {
    async fn find_or_create_position(
        &mut self,
        fingerprint: &str,
        display: &str,
        handicap: Handicap,
    ) -> Result<PositionNode, StoreError> {
        // The no-op DO UPDATE makes RETURNING fire on the conflict path too.
        let (id, fingerprint, opening): (i64, String, Option<String>) = sqlx::query_as(
            r#"
            INSERT INTO positions (sfen, csa, handicap_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (sfen) DO UPDATE SET sfen = EXCLUDED.sfen
            RETURNING id, sfen, opening
            "#,
        )
        .bind(fingerprint)
        .bind(display)
        .bind(handicap.id())
        .fetch_one(&mut *self.txn)
        .await
        .map_err(backend)?;

        Ok(PositionNode {
            id,
            fingerprint,
            opening,
        })
    }

    async fn find_or_create_move(
        &mut self,
        from: PositionId,
        to: PositionId,
        notation: &str,
    ) -> Result<MoveEdge, StoreError> {
        let (id, from, to, notation): (i64, i64, i64, String) = sqlx::query_as(
            r#"
            INSERT INTO moves (prev_position_id, next_position_id, csa)
            VALUES ($1, $2, $3)
            ON CONFLICT (prev_position_id, next_position_id)
                DO UPDATE SET prev_position_id = EXCLUDED.prev_position_id
            RETURNING id, prev_position_id, next_position_id, csa
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(notation)
        .fetch_one(&mut *self.txn)
        .await
        .map_err(backend)?;

        Ok(MoveEdge {
            id,
            from,
            to,
            notation,
        })
    }

    async fn bump_position_result(
        &mut self,
        id: PositionId,
        category: SourceCategory,
        result: GameResult,
    ) -> Result<(), StoreError> {
        let col = position_stat_column(category, result);
        let sql = format!("UPDATE positions SET {col} = {col} + 1 WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn bump_move_total(
        &mut self,
        id: MoveId,
        category: SourceCategory,
    ) -> Result<(), StoreError> {
        let col = move_stat_column(category);
        let sql = format!("UPDATE moves SET {col} = {col} + 1 WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn set_opening_if_empty(
        &mut self,
        id: PositionId,
        opening: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE positions SET opening = $1 WHERE id = $2 AND opening IS NULL")
            .bind(opening)
            .bind(id)
            .execute(&mut *self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn link_game(
        &mut self,
        game: GameId,
        position: PositionId,
        ply: usize,
        next_move: Option<MoveId>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO appearances (game_id, position_id, ply, next_move_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (game_id, position_id) DO NOTHING
            "#,
        )
        .bind(game)
        .bind(position)
        .bind(ply_column(ply)?)
        .bind(next_move)
        .execute(&mut *self.txn)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(backend)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(backend)
    }
}

fn position_stat_column(category: SourceCategory, result: GameResult) -> &'static str {
    match (category, result) {
        (SourceCategory::Professional, GameResult::BlackWin) => "stat1_black",
        (SourceCategory::Professional, GameResult::WhiteWin) => "stat1_white",
        (SourceCategory::Professional, GameResult::Draw) => "stat1_draw",
        (SourceCategory::AmateurOnline, GameResult::BlackWin) => "stat2_black",
        (SourceCategory::AmateurOnline, GameResult::WhiteWin) => "stat2_white",
        (SourceCategory::AmateurOnline, GameResult::Draw) => "stat2_draw",
    }
}

fn move_stat_column(category: SourceCategory) -> &'static str {
    match category {
        SourceCategory::Professional => "stat1_total",
        SourceCategory::AmateurOnline => "stat2_total",
    }
}

/// Checked conversion to the INTEGER ply column.
fn ply_column(ply: usize) -> Result<i32, StoreError> {
    i32::try_from(ply).map_err(|err| StoreError::Backend(err.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ply_conversion_refuses_to_truncate() {
        assert_eq!(ply_column(0).unwrap(), 0);
        assert_eq!(ply_column(512).unwrap(), 512);
        assert!(ply_column(usize::try_from(i32::MAX).unwrap() + 1).is_err());
    }

    #[test]
    fn stat_columns_cover_every_bucket() {
        assert_eq!(
            position_stat_column(SourceCategory::Professional, GameResult::BlackWin),
            "stat1_black"
        );
        assert_eq!(
            position_stat_column(SourceCategory::AmateurOnline, GameResult::Draw),
            "stat2_draw"
        );
        assert_eq!(move_stat_column(SourceCategory::AmateurOnline), "stat2_total");
    }
}
