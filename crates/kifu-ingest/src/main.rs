use std::path::Path;

use glob::glob;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kifu_ingest::db::{create_pool, run_migrations, PgGraphStore, PgSourceDirectory};
use kifu_ingest::{Config, IngestError};
use opening_graph::{KifuSubmission, SubmitError, Submitter};

fn read_submission(path: &Path) -> Result<KifuSubmission, IngestError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let submitter = Submitter::new(
        PgGraphStore::new(pool.clone()),
        PgSourceDirectory::new(pool),
    );

    let mut ingested = 0usize;
    let mut duplicates = 0usize;
    let mut rejected = 0usize;

    for entry in glob(&config.submissions_glob)? {
        let path = entry?;
        let submission = match read_submission(&path) {
            Ok(submission) => submission,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable submission file");
                rejected += 1;
                continue;
            }
        };

        match submitter.submit(&submission).await {
            Ok(outcome) => {
                ingested += 1;
                info!(
                    path = %path.display(),
                    game_id = outcome.game_id,
                    positions = outcome.positions,
                    "ingested"
                );
            }
            Err(SubmitError::Duplicate) => {
                duplicates += 1;
                info!(path = %path.display(), "already ingested, skipping");
            }
            Err(err) => {
                rejected += 1;
                warn!(
                    path = %path.display(),
                    error = %err,
                    retryable = err.is_retryable(),
                    "submission rejected"
                );
            }
        }
    }

    info!(ingested, duplicates, rejected, "ingest run complete");
    Ok(())
}
