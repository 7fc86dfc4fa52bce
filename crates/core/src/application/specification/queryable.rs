// Queryable specification - closure filters, portable to every backend

use crate::application::specification::{Specification, SpecificationResult};
use crate::domain::{Entity, Query};
use crate::error::{RepositoryError, Result};
use crate::port::{QueryExecutor, UnitOfWork};
use std::sync::Arc;

/// Base for specifications whose filters are plain Rust closures
///
/// Closure filters can not be translated into a storage engine's native
/// query language, so backends evaluate them client-side after loading the
/// candidate rows. Use [`CriteriaSpecification`](super::CriteriaSpecification)
/// when the filter should run inside the engine.
///
/// # Example
/// ```text
/// impl<U: UnitOfWork> CustomerSpecification<U> for QueryableCustomerSpecification {
///     fn with_age(&mut self, age: i64) -> &mut dyn CustomerSpecification<U> {
///         self.inner.filter(move |c: &Customer| c.age == age);
///         self
///     }
/// }
/// ```
pub struct QueryableSpecification<T: Entity> {
    executor: Option<Arc<dyn QueryExecutor<T>>>,
    query: Query<T>,
}

impl<T: Entity> QueryableSpecification<T> {
    pub fn new() -> Self {
        Self {
            executor: None,
            query: Query::new(),
        }
    }

    /// Binds to the unit of work and starts from an empty filter
    pub fn bind<U: UnitOfWork>(&mut self, unit_of_work: &U) {
        self.executor = Some(unit_of_work.queryable::<T>());
        self.query = Query::new();
    }

    pub fn is_initialized(&self) -> bool {
        self.executor.is_some()
    }

    /// Adds one filter; all filters must hold
    pub fn filter<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.query.add_predicate(Arc::new(predicate));
        self
    }

    pub fn result(&self) -> Result<SpecificationResult<T>> {
        let executor = self.executor.clone().ok_or(RepositoryError::NotInitialized(
            std::any::type_name::<Self>(),
        ))?;
        Ok(SpecificationResult::new(executor, self.query.clone()))
    }
}

impl<T: Entity> Default for QueryableSpecification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity, U: UnitOfWork> Specification<T, U> for QueryableSpecification<T> {
    fn initialize(&mut self, unit_of_work: &U) -> Result<()> {
        self.bind(unit_of_work);
        Ok(())
    }

    fn to_result(&self) -> Result<SpecificationResult<T>> {
        self.result()
    }
}
