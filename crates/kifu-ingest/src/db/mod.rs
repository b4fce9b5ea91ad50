pub mod graph;
pub mod pool;
pub mod sources;

pub use graph::{PgGraphStore, PgGraphTxn};
pub use pool::{create_pool, run_migrations};
pub use sources::{create_source, PgSourceDirectory};

use opening_graph::StoreError;

pub(crate) fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.into())
}
