//! Game source lookup and registration.

use opening_graph::{GameSource, SourceDirectory, SourceId, StoreError};
use sqlx::PgPool;

use super::backend;

#[derive(Clone)]
pub struct PgSourceDirectory {
    pool: PgPool,
}

impl PgSourceDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SourceDirectory for PgSourceDirectory {
    async fn resolve_trusted_source(
        &self,
        pass: &str,
    ) -> Result<Option<GameSource>, StoreError> {
        let row: Option<(i64, String, i16, Option<String>)> = sqlx::query_as(
            "SELECT id, name, category, kifu_url_header FROM game_sources WHERE pass = $1",
        )
        .bind(pass)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|(id, name, category_code, kifu_url_header)| GameSource {
            id,
            name,
            category_code,
            kifu_url_header,
        }))
    }
}

pub async fn create_source(
    pool: &PgPool,
    name: &str,
    pass: &str,
    category: i16,
    kifu_url_header: Option<&str>,
) -> Result<SourceId, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO game_sources (name, pass, category, kifu_url_header)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(pass)
    .bind(category)
    .bind(kifu_url_header)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
