//! Register a trusted game source.
//!
//! Usage: add-source <name> <pass> <category> [kifu-url-header]

use std::env;

use tracing_subscriber::EnvFilter;

use kifu_ingest::db::{create_pool, create_source, run_migrations};
use kifu_ingest::{Config, IngestError};

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: add-source <name> <pass> <category> [kifu-url-header]");
        std::process::exit(2);
    }
    let category: i16 = args[3]
        .parse()
        .map_err(|_| IngestError::Config("category must be a small integer"))?;
    let kifu_url_header = args.get(4).map(String::as_str);

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let id = create_source(&pool, &args[1], &args[2], category, kifu_url_header).await?;
    println!("created game source {} (id {})", args[1], id);
    Ok(())
}
