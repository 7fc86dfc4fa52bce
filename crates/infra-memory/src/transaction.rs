// Memory transaction - a mark in the session's staged change list

use crate::session::MemorySession;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use unitas_core::error::Result;
use unitas_core::port::Transaction;

/// Transaction scope of a [`crate::MemoryUnitOfWork`]
///
/// Rolling back truncates the staged changes to where the scope began.
/// Committing the outermost scope flushes the session.
pub struct MemoryTransaction {
    session: Arc<MemorySession>,
    scope: u64,
    finished: bool,
}

impl MemoryTransaction {
    pub(crate) fn new(session: Arc<MemorySession>, scope: u64) -> Self {
        Self {
            session,
            scope,
            finished: false,
        }
    }

    /// False once this scope or an enclosing one has ended
    pub fn is_active(&self) -> bool {
        !self.finished && self.session.is_open_scope(self.scope)
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.session.commit_scope(self.scope)
    }

    async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.session.rollback_scope(self.scope);
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if self.session.is_open_scope(self.scope) {
            warn!(
                session = self.session.id(),
                scope = self.scope,
                "Transaction dropped without commit, rolling back"
            );
        }
        self.session.rollback_scope(self.scope);
    }
}
