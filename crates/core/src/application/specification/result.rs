// Specification Result - deferred, chainable query surface

use crate::domain::{Entity, Query, SortDirection};
use crate::error::{RepositoryError, Result};
use crate::port::QueryExecutor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a [`SpecificationResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPhase {
    /// Holds only the filter snapshot taken by `to_result`
    Unbound,
    /// At least one ordering or paging call was chained
    Building,
    /// A materializer ran; running one again re-executes the query
    Materialized,
}

/// Filter snapshot plus ordering and paging, executed only by `to_list`,
/// `single` or `single_or_default`
///
/// Chaining never touches storage. Evaluation order is fixed at
/// filter -> order -> skip -> take on every backend, so
/// `skip(2).order_by_ascending("age")` and
/// `order_by_ascending("age").skip(2)` return the same rows.
///
/// # Example
/// ```text
/// let oldest = spec
///     .to_result()?
///     .order_by_descending("age")?
///     .take(1)
///     .single()
///     .await?;
/// ```
pub struct SpecificationResult<T: Entity> {
    executor: Arc<dyn QueryExecutor<T>>,
    query: Query<T>,
    building: bool,
    materialized: AtomicBool,
}

impl<T: Entity> SpecificationResult<T> {
    pub fn new(executor: Arc<dyn QueryExecutor<T>>, query: Query<T>) -> Self {
        Self {
            executor,
            query,
            building: false,
            materialized: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> ResultPhase {
        if self.materialized.load(Ordering::Relaxed) {
            ResultPhase::Materialized
        } else if self.building {
            ResultPhase::Building
        } else {
            ResultPhase::Unbound
        }
    }

    pub fn take(mut self, count: usize) -> Self {
        self.query.take(count);
        self.building = true;
        self
    }

    pub fn skip(mut self, count: usize) -> Self {
        self.query.skip(count);
        self.building = true;
        self
    }

    /// Fails before any query runs unless `field` names a single entity field
    pub fn order_by_ascending(self, field: &str) -> Result<Self> {
        self.order_by(field, SortDirection::Ascending)
    }

    pub fn order_by_descending(self, field: &str) -> Result<Self> {
        self.order_by(field, SortDirection::Descending)
    }

    fn order_by(mut self, field: &str, direction: SortDirection) -> Result<Self> {
        self.query.order_by(field, direction)?;
        self.building = true;
        Ok(self)
    }

    async fn run(&self, query: &Query<T>) -> Result<Vec<T>> {
        debug!(entity = T::NAME, query = ?query, "Materializing specification result");
        self.materialized.store(true, Ordering::Relaxed);
        self.executor.execute(query).await
    }

    /// Every match; empty when nothing matches
    pub async fn to_list(&self) -> Result<Vec<T>> {
        self.run(&self.query).await
    }

    /// Exactly one match, otherwise a cardinality error
    pub async fn single(&self) -> Result<T> {
        self.single_or_default().await?.ok_or_else(|| {
            RepositoryError::Cardinality("Sequence contains no elements".to_string())
        })
    }

    /// Zero or one match; more than one is still an error
    pub async fn single_or_default(&self) -> Result<Option<T>> {
        let mut probe = self.query.clone();
        probe.take(2);

        let mut rows = self.run(&probe).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(RepositoryError::Cardinality(
                "Sequence contains more than one element".to_string(),
            )),
        }
    }
}
