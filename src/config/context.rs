use std::sync::Arc;

use sqlx::sqlite::SqliteJournalMode;

use crate::context::GridContext;
use crate::error::{GridError, GridResult};
use crate::repository::{interface::Repository, sqlite::SqliteRepository};

#[cfg(feature = "store-postgres")]
use crate::repository::postgres::PostgresRepository;

use super::schema;

/// Build a `GridContext` from a parsed config: connects to the configured
/// store and runs any pending migrations.
pub async fn build_context(config: &schema::GridConfig) -> GridResult<GridContext> {
    let repository: Arc<dyn Repository> = match &config.store {
        #[cfg(feature = "store-postgres")]
        schema::Store::Postgres(schema::Postgres { dsn, schema }) => Arc::new(
            PostgresRepository::try_new(dsn.to_string(), schema.to_string())
                .await
                .map_err(GridError::SqlxError)?,
        ),
        schema::Store::Sqlite(schema::Sqlite { dsn }) => Arc::new(
            SqliteRepository::try_new(dsn.to_string(), SqliteJournalMode::Wal)
                .await
                .map_err(GridError::SqlxError)?,
        ),
    };

    Ok(GridContext::new(repository))
}
