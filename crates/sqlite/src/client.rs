//! SQLite pool wrapper.

use crate::config::SqliteConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use collector_core::error::DbErrorCode;
use collector_core::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// SQLite store with connection pooling.
///
/// Every connection enforces foreign keys.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    config: SqliteConfig,
}

impl SqliteStore {
    /// Opens (creating if missing) the configured database.
    pub async fn connect(config: SqliteConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| Error::internal(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        if config.is_memory() {
            // Each in-memory connection is its own database; pin exactly one.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            pool_options = pool_options.max_connections(config.max_connections.max(1));
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| Error::internal(format!("Failed to open database: {}", e)))?;

        info!(url = %config.url, "Opened SQLite store");

        Ok(Self { pool, config })
    }

    /// Opens a private in-memory database with the schema applied.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect(SqliteConfig::in_memory()).await?;
        crate::health::init_schema(&store).await?;
        Ok(store)
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Closes every pooled connection. Later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Map a write failure, turning unique violations into conflicts.
pub(crate) fn write_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    write_error_or_conflict(context, "record already exists")
}

/// Like `write_error` with a fixed client-facing conflict message.
///
/// The constraint detail names tables and columns, so it only goes to the log.
pub(crate) fn write_error_or_conflict(
    context: &'static str,
    conflict: &'static str,
) -> impl Fn(sqlx::Error) -> Error {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            warn!(context, detail = %db.message(), "Unique constraint violated");
            Error::conflict(conflict)
        }
        _ => Error::database(DbErrorCode::StoreFailed, format!("{}: {}", context, e)),
    }
}

/// Map a read failure.
pub(crate) fn read_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::database(DbErrorCode::QueryFailed, format!("{}: {}", context, e))
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort lexically.
pub(crate) fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            Error::database(
                DbErrorCode::QueryFailed,
                format!("Invalid stored timestamp '{}': {}", raw, e),
            )
        })
}
