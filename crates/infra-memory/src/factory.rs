// Memory Unit of Work Factory

use crate::options::MemoryOptions;
use crate::session::MemorySession;
use crate::store::MemoryStore;
use crate::unit_of_work::MemoryUnitOfWork;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use unitas_core::error::{RepositoryError, Result};
use unitas_core::port::UnitOfWorkFactory;

/// Opens memory units of work over one shared store
pub struct MemoryUnitOfWorkFactory {
    store: Arc<MemoryStore>,
    options: MemoryOptions,
    closed: AtomicBool,
    next_session: AtomicU64,
}

impl MemoryUnitOfWorkFactory {
    pub fn new(options: MemoryOptions) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), options)
    }

    /// Shares an existing store, e.g. between factories with different options
    pub fn with_store(store: Arc<MemoryStore>, options: MemoryOptions) -> Self {
        Self {
            store,
            options,
            closed: AtomicBool::new(false),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn options(&self) -> MemoryOptions {
        self.options
    }
}

impl Default for MemoryUnitOfWorkFactory {
    fn default() -> Self {
        Self::new(MemoryOptions::default())
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryUnitOfWorkFactory {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin_unit_of_work(&self) -> Result<MemoryUnitOfWork> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RepositoryError::InvalidState(
                "unit of work factory is closed".to_string(),
            ));
        }

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, "Unit of work opened");
        let session = MemorySession::new(id, self.store.clone(), self.options);
        Ok(MemoryUnitOfWork::new(Arc::new(session)))
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Memory unit of work factory closed");
        }
        Ok(())
    }
}
