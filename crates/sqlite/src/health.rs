//! Store health checks and schema setup.

use crate::client::SqliteStore;
use collector_core::{Error, Result};
use tracing::{debug, error};

/// Check database connection health.
pub async fn check_connection(store: &SqliteStore) -> bool {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(store.pool())
        .await
    {
        Ok(_) => {
            debug!("SQLite connection healthy");
            true
        }
        Err(e) => {
            error!("SQLite health check failed: {}", e);
            false
        }
    }
}

/// Create tables and indexes if they do not exist.
pub async fn init_schema(store: &SqliteStore) -> Result<()> {
    use crate::schema::all_tables;

    for ddl in all_tables() {
        sqlx::query(ddl)
            .execute(store.pool())
            .await
            .map_err(|e| Error::internal(format!("Failed to execute DDL: {}", e)))?;
    }

    debug!("SQLite schema initialized");
    Ok(())
}
