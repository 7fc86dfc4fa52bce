// SQLite session - lazily opened session transaction plus savepoint stack

use crate::codec::decode_row;
use crate::error::map_sqlx_error;
use parking_lot::Mutex as SyncMutex;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{QueryBuilder, Sqlite, Transaction as SqlxTransaction};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use unitas_core::domain::Record;
use unitas_core::error::{RepositoryError, Result};

#[derive(Default)]
pub(crate) struct SessionState {
    tx: Option<SqlxTransaction<'static, Sqlite>>,
    savepoints: Vec<String>,
    next_savepoint: u64,
}

/// Shared by a unit of work, its transactions and its query executors
pub(crate) struct SqliteSession {
    id: u64,
    pool: SqlitePool,
    state: Mutex<SessionState>,
    /// Savepoints of transactions dropped without commit; Drop can not
    /// await, so the rollback runs before the next session operation
    pending_rollbacks: SyncMutex<Vec<String>>,
    closed: AtomicBool,
}

impl SqliteSession {
    pub fn new(id: u64, pool: SqlitePool) -> Self {
        Self {
            id,
            pool,
            state: Mutex::new(SessionState::default()),
            pending_rollbacks: SyncMutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Locks the session and settles rollbacks queued by dropped transactions
    async fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RepositoryError::InvalidState(
                "unit of work is closed".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let pending: Vec<String> = std::mem::take(&mut *self.pending_rollbacks.lock());
        for savepoint in pending {
            self.rollback_savepoint(&mut state, &savepoint).await?;
        }
        Ok(state)
    }

    async fn ensure_transaction<'s>(
        &self,
        state: &'s mut SessionState,
    ) -> Result<&'s mut SqliteConnection> {
        if state.tx.is_none() {
            let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
            debug!(session = self.id, "Session transaction opened");
            state.tx = Some(tx);
        }

        state
            .tx
            .as_deref_mut()
            .ok_or_else(|| RepositoryError::InvalidState("session transaction missing".to_string()))
    }

    /// Runs a write inside the session transaction; returns affected rows
    pub async fn execute(&self, mut builder: QueryBuilder<'static, Sqlite>) -> Result<u64> {
        let mut state = self.lock().await?;
        let connection = self.ensure_transaction(&mut state).await?;

        let result = builder
            .build()
            .execute(connection)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    /// Reads through the session transaction when one is open so staged
    /// writes are visible
    pub async fn fetch(&self, mut builder: QueryBuilder<'static, Sqlite>) -> Result<Vec<Record>> {
        let mut state = self.lock().await?;
        let query = builder.build();

        let rows = match state.tx.as_deref_mut() {
            Some(connection) => query.fetch_all(connection).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(map_sqlx_error)?;

        rows.iter().map(decode_row).collect()
    }

    /// Commits the session transaction; deferred while a scope is open
    pub async fn flush(&self) -> Result<()> {
        let mut state = self.lock().await?;
        if !state.savepoints.is_empty() {
            debug!(
                session = self.id,
                scopes = state.savepoints.len(),
                "Flush deferred to outermost commit"
            );
            return Ok(());
        }
        self.commit_session(&mut state).await
    }

    pub async fn begin_savepoint(&self) -> Result<String> {
        let mut state = self.lock().await?;
        state.next_savepoint += 1;
        let savepoint = format!("uow_sp_{}", state.next_savepoint);

        let connection = self.ensure_transaction(&mut state).await?;
        sqlx::query(&format!("SAVEPOINT {savepoint}"))
            .execute(connection)
            .await
            .map_err(map_sqlx_error)?;

        state.savepoints.push(savepoint.clone());
        debug!(
            session = self.id,
            savepoint = %savepoint,
            depth = state.savepoints.len(),
            "Transaction started"
        );
        Ok(savepoint)
    }

    /// Releases a savepoint and the ones nested in it; the outermost
    /// release commits the session transaction
    pub async fn commit_savepoint(&self, savepoint: &str) -> Result<()> {
        let mut state = self.lock().await?;
        let position = state
            .savepoints
            .iter()
            .position(|s| s == savepoint)
            .ok_or_else(|| {
                RepositoryError::InvalidState(format!(
                    "transaction {savepoint} is no longer active (an enclosing scope already ended)"
                ))
            })?;

        let connection = self.ensure_transaction(&mut state).await?;
        sqlx::query(&format!("RELEASE SAVEPOINT {savepoint}"))
            .execute(connection)
            .await
            .map_err(map_sqlx_error)?;
        state.savepoints.truncate(position);

        if !state.savepoints.is_empty() {
            debug!(session = self.id, savepoint = %savepoint, "Nested transaction committed");
            return Ok(());
        }

        self.commit_session(&mut state).await?;
        info!(session = self.id, savepoint = %savepoint, "Transaction committed");
        Ok(())
    }

    pub async fn rollback(&self, savepoint: &str) -> Result<()> {
        let mut state = self.lock().await?;
        self.rollback_savepoint(&mut state, savepoint).await
    }

    /// Queues a rollback for the next operation
    pub fn defer_rollback(&self, savepoint: String) {
        self.pending_rollbacks.lock().push(savepoint);
    }

    pub fn is_active(&self, savepoint: &str) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        match self.state.try_lock() {
            Ok(state) => state.savepoints.iter().any(|s| s == savepoint),
            Err(_) => true,
        }
    }

    /// Rolls back everything not yet flushed and closes the session
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        self.pending_rollbacks.lock().clear();
        state.savepoints.clear();
        if let Some(tx) = state.tx.take() {
            warn!(session = self.id, "Unit of work closed with unflushed changes, rolling back");
            tx.rollback().await.map_err(map_sqlx_error)?;
        }
        debug!(session = self.id, "Unit of work closed");
        Ok(())
    }

    /// Synchronous close for Drop; sqlx rolls the dropped transaction back
    /// when its connection returns to the pool
    pub fn abandon(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        match self.state.try_lock() {
            Ok(mut state) => {
                state.savepoints.clear();
                if state.tx.take().is_some() {
                    warn!(
                        session = self.id,
                        "Unit of work dropped with unflushed changes, rolling back"
                    );
                }
            }
            Err(_) => warn!(session = self.id, "Unit of work dropped while busy"),
        }
    }

    async fn commit_session(&self, state: &mut SessionState) -> Result<()> {
        if let Some(tx) = state.tx.take() {
            tx.commit().await.map_err(map_sqlx_error)?;
            info!(session = self.id, "Flushed session transaction");
        }
        Ok(())
    }

    /// Unknown savepoints are ignored since an enclosing rollback or release
    /// already covered them. A failed rollback discards the whole session
    /// transaction so the scope's writes can not reach a later commit.
    async fn rollback_savepoint(&self, state: &mut SessionState, savepoint: &str) -> Result<()> {
        let Some(position) = state.savepoints.iter().position(|s| s == savepoint) else {
            return Ok(());
        };

        let Some(connection) = state.tx.as_deref_mut() else {
            state.savepoints.truncate(position);
            return Ok(());
        };
        let mut rolled_back = sqlx::query(&format!("ROLLBACK TO SAVEPOINT {savepoint}"))
            .execute(&mut *connection)
            .await;
        if rolled_back.is_ok() {
            rolled_back = sqlx::query(&format!("RELEASE SAVEPOINT {savepoint}"))
                .execute(&mut *connection)
                .await;
        }

        if let Err(err) = rolled_back {
            warn!(
                session = self.id,
                savepoint = %savepoint,
                error = %err,
                "Savepoint rollback failed, discarding session transaction"
            );
            state.savepoints.clear();
            if let Some(tx) = state.tx.take() {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(session = self.id, error = %rollback_err, "Session rollback failed");
                }
            }
            return Err(map_sqlx_error(err));
        }

        state.savepoints.truncate(position);
        debug!(session = self.id, savepoint = %savepoint, "Transaction rolled back");
        Ok(())
    }
}
