//! Connection pool and schema bootstrap.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS game_sources (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    pass TEXT NOT NULL UNIQUE,
    category SMALLINT NOT NULL,
    kifu_url_header TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS positions (
    id BIGSERIAL PRIMARY KEY,
    sfen TEXT NOT NULL UNIQUE,
    csa TEXT NOT NULL,
    handicap_id SMALLINT NOT NULL,
    opening TEXT,
    stat1_black BIGINT NOT NULL DEFAULT 0,
    stat1_white BIGINT NOT NULL DEFAULT 0,
    stat1_draw BIGINT NOT NULL DEFAULT 0,
    stat2_black BIGINT NOT NULL DEFAULT 0,
    stat2_white BIGINT NOT NULL DEFAULT 0,
    stat2_draw BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS moves (
    id BIGSERIAL PRIMARY KEY,
    prev_position_id BIGINT NOT NULL REFERENCES positions(id),
    next_position_id BIGINT NOT NULL REFERENCES positions(id),
    csa TEXT NOT NULL,
    stat1_total BIGINT NOT NULL DEFAULT 0,
    stat2_total BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (prev_position_id, next_position_id)
);

CREATE TABLE IF NOT EXISTS games (
    id BIGSERIAL PRIMARY KEY,
    game_source_id BIGINT NOT NULL REFERENCES game_sources(id),
    black_name TEXT NOT NULL,
    white_name TEXT NOT NULL,
    played_on DATE,
    handicap_id SMALLINT NOT NULL,
    result SMALLINT NOT NULL,
    csa TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS games_identity_idx
    ON games (game_source_id, black_name, white_name,
              COALESCE(played_on, DATE '0001-01-01'), md5(csa));

CREATE TABLE IF NOT EXISTS appearances (
    id BIGSERIAL PRIMARY KEY,
    game_id BIGINT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    position_id BIGINT NOT NULL REFERENCES positions(id),
    ply INTEGER NOT NULL,
    next_move_id BIGINT REFERENCES moves(id),
    UNIQUE (game_id, position_id)
);
"#;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}
