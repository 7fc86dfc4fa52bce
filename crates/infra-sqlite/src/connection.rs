// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use crate::settings::SqliteSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use unitas_core::error::{RepositoryError, Result};

/// Create SQLite connection pool with WAL mode and foreign keys on
pub async fn create_pool(settings: &SqliteSettings) -> Result<SqlitePool> {
    let journal_mode = if settings.wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };

    let options = SqliteConnectOptions::from_str(&settings.database_url)
        .map_err(|e| RepositoryError::Config(format!("invalid database url: {e}")))?
        .journal_mode(journal_mode)
        .busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)?;

    info!(
        database_url = %settings.database_url,
        max_connections = settings.max_connections,
        "SQLite pool ready"
    );
    Ok(pool)
}
