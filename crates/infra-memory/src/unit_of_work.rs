// Memory Unit of Work - deferred-submit session over a shared MemoryStore

use crate::session::MemorySession;
use crate::store::ChangeKind;
use crate::transaction::MemoryTransaction;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};
use unitas_core::domain::{Entity, Query};
use unitas_core::error::{RepositoryError, Result};
use unitas_core::port::{Capabilities, QueryExecutor, UnitOfWork};

/// Unit of work of the memory backend
///
/// Mutations are only recorded until `flush` or the outermost transaction
/// commit applies them to the store in one step. Reads through this unit of
/// work see its own staged changes; other units of work do not.
pub struct MemoryUnitOfWork {
    session: Arc<MemorySession>,
}

impl MemoryUnitOfWork {
    pub(crate) fn new(session: Arc<MemorySession>) -> Self {
        Self { session }
    }

    pub fn session_id(&self) -> u64 {
        self.session.id()
    }

    /// Number of changes waiting for flush
    pub fn staged_count(&self) -> usize {
        self.session.staged_count()
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    type Transaction = MemoryTransaction;

    fn capabilities(&self) -> Capabilities {
        let options = self.session.options();
        Capabilities {
            flushes_on_dispose: options.flushes_on_dispose,
            supports_generic_get_by_id: options.supports_generic_get_by_id,
        }
    }

    async fn insert<T: Entity>(&self, entity: &T) -> Result<()> {
        self.session.stage(entity, ChangeKind::Insert)
    }

    async fn update<T: Entity>(&self, entity: &T) -> Result<()> {
        self.session.stage(entity, ChangeKind::Update)
    }

    async fn delete<T: Entity>(&self, entity: &T) -> Result<()> {
        self.session.stage(entity, ChangeKind::Delete)
    }

    async fn get_by_id<T: Entity>(&self, id: &T::Key) -> Result<Option<T>> {
        if !self.session.options().supports_generic_get_by_id {
            return Err(RepositoryError::NotSupported(format!(
                "generic lookup by id for {} - implement in repository",
                T::NAME
            )));
        }
        self.session.find::<T>(&id.clone().into())
    }

    async fn get_all<T: Entity>(&self) -> Result<Vec<T>> {
        self.session.rows::<T>()
    }

    async fn flush(&self) -> Result<()> {
        self.session.flush()
    }

    async fn begin_transaction(&self) -> Result<MemoryTransaction> {
        let scope = self.session.begin_scope()?;
        Ok(MemoryTransaction::new(self.session.clone(), scope))
    }

    fn queryable<T: Entity>(&self) -> Arc<dyn QueryExecutor<T>> {
        Arc::new(MemoryQueryExecutor::<T> {
            session: self.session.clone(),
            _entity: PhantomData,
        })
    }

    async fn close(self) -> Result<()> {
        self.session.dispose()
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if let Err(err) = self.session.dispose() {
            warn!(session = self.session.id(), error = %err, "Flush on dispose failed");
        }
    }
}

/// Evaluates queries over the session's visible rows
struct MemoryQueryExecutor<T> {
    session: Arc<MemorySession>,
    _entity: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: Entity> QueryExecutor<T> for MemoryQueryExecutor<T> {
    async fn execute(&self, query: &Query<T>) -> Result<Vec<T>> {
        let rows = self.session.rows::<T>()?;
        debug!(
            session = self.session.id(),
            entity = T::NAME,
            candidates = rows.len(),
            "Evaluating query"
        );
        Ok(query.evaluate(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryOptions, MemoryUnitOfWorkFactory};
    use unitas_core::domain::{Record, SortDirection};
    use unitas_core::port::{Transaction, UnitOfWorkFactory};

    #[derive(Debug, Clone, PartialEq)]
    struct Parcel {
        id: i64,
        weight: i64,
    }

    impl Entity for Parcel {
        type Key = i64;
        const NAME: &'static str = "parcels";
        const KEY_FIELD: &'static str = "id";
        const FIELDS: &'static [&'static str] = &["id", "weight"];

        fn key(&self) -> i64 {
            self.id
        }

        fn to_record(&self) -> Result<Record> {
            Ok(Record::new().with("id", self.id).with("weight", self.weight))
        }

        fn from_record(record: Record) -> Result<Self> {
            Ok(Parcel {
                id: record.integer("id")?,
                weight: record.integer("weight")?,
            })
        }
    }

    fn parcel(id: i64, weight: i64) -> Parcel {
        Parcel { id, weight }
    }

    #[tokio::test]
    async fn test_staged_changes_are_session_local_until_flush() {
        let factory = MemoryUnitOfWorkFactory::default();
        let writer = factory.begin_unit_of_work().await.unwrap();
        let reader = factory.begin_unit_of_work().await.unwrap();

        writer.insert(&parcel(1, 10)).await.unwrap();
        assert_eq!(writer.get_all::<Parcel>().await.unwrap().len(), 1);
        assert!(reader.get_all::<Parcel>().await.unwrap().is_empty());

        writer.flush().await.unwrap();
        assert_eq!(writer.staged_count(), 0);
        assert_eq!(reader.get_all::<Parcel>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_without_flush_discards_changes() {
        let factory = MemoryUnitOfWorkFactory::default();
        {
            let uow = factory.begin_unit_of_work().await.unwrap();
            uow.insert(&parcel(1, 10)).await.unwrap();
        }
        assert_eq!(factory.store().row_count(Parcel::NAME), 0);
    }

    #[tokio::test]
    async fn test_flushing_on_dispose_option() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryOptions::flushing_on_dispose());
        let uow = factory.begin_unit_of_work().await.unwrap();
        assert!(uow.capabilities().flushes_on_dispose);

        uow.insert(&parcel(1, 10)).await.unwrap();
        uow.close().await.unwrap();
        assert_eq!(factory.store().row_count(Parcel::NAME), 1);
    }

    #[tokio::test]
    async fn test_closed_unit_of_work_rejects_operations() {
        let factory = MemoryUnitOfWorkFactory::default();
        let uow = factory.begin_unit_of_work().await.unwrap();
        let tx = uow.begin_transaction().await.unwrap();
        uow.session.dispose().unwrap();

        let result = uow.insert(&parcel(1, 10)).await;
        assert!(matches!(result, Err(RepositoryError::InvalidState(_))));
        assert!(!tx.is_active());
    }

    #[tokio::test]
    async fn test_nested_commit_defers_to_outer_scope() {
        let factory = MemoryUnitOfWorkFactory::default();
        let uow = factory.begin_unit_of_work().await.unwrap();

        let outer = uow.begin_transaction().await.unwrap();
        uow.insert(&parcel(1, 10)).await.unwrap();

        let inner = uow.begin_transaction().await.unwrap();
        uow.insert(&parcel(2, 20)).await.unwrap();
        inner.commit().await.unwrap();
        assert_eq!(factory.store().row_count(Parcel::NAME), 0);

        outer.commit().await.unwrap();
        assert_eq!(factory.store().row_count(Parcel::NAME), 2);
    }

    #[tokio::test]
    async fn test_inner_rollback_keeps_outer_changes() {
        let factory = MemoryUnitOfWorkFactory::default();
        let uow = factory.begin_unit_of_work().await.unwrap();

        let outer = uow.begin_transaction().await.unwrap();
        uow.insert(&parcel(1, 10)).await.unwrap();
        {
            let _inner = uow.begin_transaction().await.unwrap();
            uow.insert(&parcel(2, 20)).await.unwrap();
        }
        outer.commit().await.unwrap();

        let rows = uow.get_all::<Parcel>().await.unwrap();
        assert_eq!(rows, vec![parcel(1, 10)]);
    }

    #[tokio::test]
    async fn test_flush_inside_transaction_is_enlisted() {
        let factory = MemoryUnitOfWorkFactory::default();
        let uow = factory.begin_unit_of_work().await.unwrap();

        let tx = uow.begin_transaction().await.unwrap();
        uow.insert(&parcel(1, 10)).await.unwrap();
        uow.flush().await.unwrap();
        assert_eq!(factory.store().row_count(Parcel::NAME), 0);

        tx.rollback().await.unwrap();
        assert!(uow.get_all::<Parcel>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_scope() {
        let factory = MemoryUnitOfWorkFactory::default();
        let uow = factory.begin_unit_of_work().await.unwrap();
        uow.insert(&parcel(1, 10)).await.unwrap();
        uow.flush().await.unwrap();

        let tx = uow.begin_transaction().await.unwrap();
        uow.insert(&parcel(1, 99)).await.unwrap();
        let result = tx.commit().await;

        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert_eq!(uow.staged_count(), 0);
        let stored = uow.get_by_id::<Parcel>(&1).await.unwrap();
        assert_eq!(stored, Some(parcel(1, 10)));
    }

    #[tokio::test]
    async fn test_predicate_only_rejects_get_by_id() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryOptions::predicate_only());
        let uow = factory.begin_unit_of_work().await.unwrap();

        assert!(!uow.supports_generic_get_by_id());
        let result = uow.get_by_id::<Parcel>(&1).await;
        assert!(matches!(result, Err(RepositoryError::NotSupported(_))));
    }

    #[tokio::test]
    async fn test_queryable_orders_and_pages() {
        let factory = MemoryUnitOfWorkFactory::default();
        let uow = factory.begin_unit_of_work().await.unwrap();
        for (id, weight) in [(1, 30), (2, 10), (3, 20)] {
            uow.insert(&parcel(id, weight)).await.unwrap();
        }

        let mut query = Query::<Parcel>::new();
        query.order_by("weight", SortDirection::Descending).unwrap();
        query.skip(1);

        let rows = uow.queryable::<Parcel>().execute(&query).await.unwrap();
        assert_eq!(rows, vec![parcel(3, 20), parcel(2, 10)]);
    }

    #[tokio::test]
    async fn test_closed_factory_rejects_new_sessions() {
        let factory = MemoryUnitOfWorkFactory::default();
        factory.close().await.unwrap();

        let result = factory.begin_unit_of_work().await;
        assert!(matches!(result, Err(RepositoryError::InvalidState(_))));
    }
}
