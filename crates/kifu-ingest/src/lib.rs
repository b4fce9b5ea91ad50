//! PostgreSQL-backed ingestion host: configuration, schema bootstrap and the
//! sqlx implementations of the graph storage and source directory traits.

pub mod config;
pub mod db;
pub mod error;

pub use config::Config;
pub use error::IngestError;
