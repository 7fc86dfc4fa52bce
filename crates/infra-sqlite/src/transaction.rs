// SQLite Transaction Implementation (savepoint scope)

use crate::session::SqliteSession;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use unitas_core::error::Result;
use unitas_core::port::Transaction;

/// Savepoint inside the session transaction of a [`crate::SqliteUnitOfWork`]
pub struct SqliteTransaction {
    session: Arc<SqliteSession>,
    savepoint: String,
    finished: bool,
}

impl SqliteTransaction {
    pub(crate) fn new(session: Arc<SqliteSession>, savepoint: String) -> Self {
        Self {
            session,
            savepoint,
            finished: false,
        }
    }

    pub fn savepoint(&self) -> &str {
        &self.savepoint
    }

    /// False once this scope or an enclosing one has ended
    pub fn is_active(&self) -> bool {
        !self.finished && self.session.is_active(&self.savepoint)
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.session.commit_savepoint(&self.savepoint).await
    }

    async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.session.rollback(&self.savepoint).await
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(
            session = self.session.id(),
            savepoint = %self.savepoint,
            "Transaction dropped without commit, rolling back"
        );
        self.session.defer_rollback(std::mem::take(&mut self.savepoint));
    }
}
