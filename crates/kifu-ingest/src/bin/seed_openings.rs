//! Tag positions with opening names from a classification tree.
//!
//! The input file is a JSON array of nodes, each carrying an opening name,
//! the fingerprints it covers, and child nodes for refinements. Tags are
//! first-wins: a position already classified keeps its classification, so
//! broad names should come before their refinements in the tree.
//!
//! Usage: seed-openings <openings.json>

use std::env;

use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kifu_ingest::db::{create_pool, run_migrations};
use kifu_ingest::{Config, IngestError};

#[derive(Debug, Deserialize)]
struct OpeningNode {
    name: String,
    #[serde(default)]
    sfens: Vec<String>,
    #[serde(default)]
    children: Vec<OpeningNode>,
}

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: seed-openings <openings.json>");
        std::process::exit(2);
    }

    let text = std::fs::read_to_string(&args[1])?;
    let roots: Vec<OpeningNode> = serde_json::from_str(&text)?;

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let mut tagged = 0u64;
    // Depth-first so parents tag before children; first-wins keeps the
    // broader name where both cover a position.
    let mut stack: Vec<&OpeningNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        for sfen in &node.sfens {
            let done =
                sqlx::query("UPDATE positions SET opening = $1 WHERE sfen = $2 AND opening IS NULL")
                    .bind(&node.name)
                    .bind(sfen)
                    .execute(&pool)
                    .await?;
            tagged += done.rows_affected();
        }
        stack.extend(node.children.iter().rev());
    }

    info!(tagged, "opening seeding complete");
    Ok(())
}
