// SQLite Unit of Work - eager-write session

use crate::session::SqliteSession;
use crate::sql;
use crate::transaction::SqliteTransaction;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;
use unitas_core::domain::{Criterion, Entity, Query};
use unitas_core::error::{RepositoryError, Result};
use unitas_core::port::{Capabilities, QueryExecutor, UnitOfWork};

/// Unit of work of the SQLite backend
///
/// Every mutation executes at once inside a session transaction opened on
/// first use, so constraint violations surface at the call. Nothing is
/// durable until `flush` or the outermost transaction commit; closing or
/// dropping the unit of work rolls unflushed work back.
pub struct SqliteUnitOfWork {
    session: Arc<SqliteSession>,
}

impl SqliteUnitOfWork {
    pub(crate) fn new(session: Arc<SqliteSession>) -> Self {
        Self { session }
    }

    pub fn session_id(&self) -> u64 {
        self.session.id()
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    type Transaction = SqliteTransaction;

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            flushes_on_dispose: false,
            supports_generic_get_by_id: true,
        }
    }

    async fn insert<T: Entity>(&self, entity: &T) -> Result<()> {
        let record = entity.to_record()?;
        self.session.execute(sql::insert::<T>(&record)).await?;
        debug!(session = self.session.id(), entity = T::NAME, key = ?entity.key(), "Inserted");
        Ok(())
    }

    async fn update<T: Entity>(&self, entity: &T) -> Result<()> {
        let record = entity.to_record()?;
        let affected = self
            .session
            .execute(sql::update::<T>(&record, entity.key_value()))
            .await?;

        if affected == 0 {
            return Err(RepositoryError::Conflict(format!(
                "{} with key {} was not found for update",
                T::NAME,
                entity.key_value()
            )));
        }
        debug!(session = self.session.id(), entity = T::NAME, key = ?entity.key(), "Updated");
        Ok(())
    }

    async fn delete<T: Entity>(&self, entity: &T) -> Result<()> {
        let affected = self
            .session
            .execute(sql::delete::<T>(entity.key_value()))
            .await?;

        if affected == 0 {
            return Err(RepositoryError::Conflict(format!(
                "{} with key {} was not found for delete",
                T::NAME,
                entity.key_value()
            )));
        }
        debug!(session = self.session.id(), entity = T::NAME, key = ?entity.key(), "Deleted");
        Ok(())
    }

    async fn get_by_id<T: Entity>(&self, id: &T::Key) -> Result<Option<T>> {
        let mut query = Query::<T>::new();
        query.add_criterion(Criterion::eq(T::KEY_FIELD, id.clone()));
        query.take(1);

        let mut records = self.session.fetch(sql::select(&query)).await?;
        records.pop().map(T::from_record).transpose()
    }

    async fn get_all<T: Entity>(&self) -> Result<Vec<T>> {
        let records = self.session.fetch(sql::select(&Query::<T>::new())).await?;
        records.into_iter().map(T::from_record).collect()
    }

    async fn flush(&self) -> Result<()> {
        self.session.flush().await
    }

    async fn begin_transaction(&self) -> Result<SqliteTransaction> {
        let savepoint = self.session.begin_savepoint().await?;
        Ok(SqliteTransaction::new(self.session.clone(), savepoint))
    }

    fn queryable<T: Entity>(&self) -> Arc<dyn QueryExecutor<T>> {
        Arc::new(SqliteQueryExecutor::<T> {
            session: self.session.clone(),
            _entity: PhantomData,
        })
    }

    async fn close(self) -> Result<()> {
        self.session.close().await
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        self.session.abandon();
    }
}

/// Translates criteria, ordering and paging into SQL
struct SqliteQueryExecutor<T> {
    session: Arc<SqliteSession>,
    _entity: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: Entity> QueryExecutor<T> for SqliteQueryExecutor<T> {
    async fn execute(&self, query: &Query<T>) -> Result<Vec<T>> {
        debug!(
            session = self.session.id(),
            entity = T::NAME,
            client_side = query.has_predicates(),
            "Executing query"
        );
        let entities = self
            .session
            .fetch(sql::select(query))
            .await?
            .into_iter()
            .map(T::from_record)
            .collect::<Result<Vec<T>>>()?;

        if query.has_predicates() {
            return Ok(query.evaluate(entities));
        }
        Ok(entities)
    }
}
