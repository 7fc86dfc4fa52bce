// SQLite Unit of Work Factory

use crate::connection::create_pool;
use crate::session::SqliteSession;
use crate::settings::SqliteSettings;
use crate::unit_of_work::SqliteUnitOfWork;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use unitas_core::error::{RepositoryError, Result};
use unitas_core::port::UnitOfWorkFactory;

/// Owns the connection pool; each unit of work borrows one connection for
/// its session transaction
pub struct SqliteUnitOfWorkFactory {
    pool: SqlitePool,
    next_session: AtomicU64,
}

impl SqliteUnitOfWorkFactory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            next_session: AtomicU64::new(1),
        }
    }

    pub async fn connect(settings: &SqliteSettings) -> Result<Self> {
        Ok(Self::new(create_pool(settings).await?))
    }

    /// Pool handle for schema management outside any unit of work
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UnitOfWorkFactory for SqliteUnitOfWorkFactory {
    type UnitOfWork = SqliteUnitOfWork;

    async fn begin_unit_of_work(&self) -> Result<SqliteUnitOfWork> {
        if self.pool.is_closed() {
            return Err(RepositoryError::InvalidState(
                "unit of work factory is closed".to_string(),
            ));
        }

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, "Unit of work opened");
        Ok(SqliteUnitOfWork::new(Arc::new(SqliteSession::new(
            id,
            self.pool.clone(),
        ))))
    }

    async fn close(&self) -> Result<()> {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("SQLite unit of work factory closed");
        }
        Ok(())
    }
}
