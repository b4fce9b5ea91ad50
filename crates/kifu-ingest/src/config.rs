//! Ingest configuration from environment variables

use std::env;

use crate::error::IngestError;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// Glob matching submission JSON files to ingest.
    pub submissions_glob: String,
}

impl Config {
    pub fn from_env() -> Result<Self, IngestError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| IngestError::Config("DATABASE_URL not set"))?;
        let submissions_glob =
            env::var("KIFU_GLOB").unwrap_or_else(|_| "./submissions/*.json".to_string());

        Ok(Self {
            database_url,
            submissions_glob,
        })
    }
}
