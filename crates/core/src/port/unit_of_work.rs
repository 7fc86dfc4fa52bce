// Unit of Work port - one bounded persistence session

use crate::domain::Entity;
use crate::error::{RepositoryError, Result};
use crate::port::query_executor::QueryExecutor;
use crate::port::transaction::Transaction;
use async_trait::async_trait;
use std::sync::Arc;

/// What a backend adapter declares about its session semantics
///
/// Callers must not assume disposal flushes; `flush()` or a committed
/// transaction is the only durability signal. `flushes_on_dispose` exists so
/// tests can assert each backend's declared policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Closing or dropping the unit of work writes staged mutations
    pub flushes_on_dispose: bool,
    /// `get_by_id` works for any entity without a repository-supplied predicate
    pub supports_generic_get_by_id: bool,
}

/// Unit of work contract every backend adapter implements
///
/// A unit of work is confined to one logical flow of control. Mutations are
/// staged against the session and are not visible to other units of work
/// until `flush` or a transaction commit makes them durable; reads through
/// the same unit of work see its own staged mutations.
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    type Transaction: Transaction;

    fn capabilities(&self) -> Capabilities;

    fn supports_generic_get_by_id(&self) -> bool {
        self.capabilities().supports_generic_get_by_id
    }

    /// Stage an insert
    async fn insert<T: Entity>(&self, entity: &T) -> Result<()>;

    /// Stage an update of an existing entity
    async fn update<T: Entity>(&self, entity: &T) -> Result<()>;

    /// Stage a delete
    async fn delete<T: Entity>(&self, entity: &T) -> Result<()>;

    /// Entity by primary key, `None` when absent
    ///
    /// Backends without a generic identity lookup keep this default and
    /// report it through `Capabilities`.
    async fn get_by_id<T: Entity>(&self, id: &T::Key) -> Result<Option<T>> {
        let _ = id;
        Err(RepositoryError::NotSupported(format!(
            "generic lookup by id for {} - implement in repository",
            T::NAME
        )))
    }

    /// Every entity of the type visible to this session; never fails for none
    async fn get_all<T: Entity>(&self) -> Result<Vec<T>>;

    /// Write staged mutations to durable storage; no-op when nothing is staged
    async fn flush(&self) -> Result<()>;

    async fn begin_transaction(&self) -> Result<Self::Transaction>;

    /// Dispose a transaction; an uncommitted one is rolled back, `None` is
    /// tolerated
    async fn end_transaction(&self, transaction: Option<Self::Transaction>) -> Result<()> {
        match transaction {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }

    /// Query executor bound to this session, used by specifications
    fn queryable<T: Entity>(&self) -> Arc<dyn QueryExecutor<T>>;

    /// Release the session handle. Whether staged mutations are written
    /// first follows `Capabilities::flushes_on_dispose`.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}
