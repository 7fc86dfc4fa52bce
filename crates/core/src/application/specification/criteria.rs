// Criteria specification - field comparisons the engine runs natively

use crate::application::specification::{Specification, SpecificationResult};
use crate::domain::{CompareOp, Criterion, Entity, Query, Value};
use crate::error::{RepositoryError, Result};
use crate::port::{QueryExecutor, UnitOfWork};
use std::sync::Arc;

/// Base for specifications built from [`Criterion`] objects
///
/// Criteria name an entity field, so every backend can push them into its
/// native query (SQL `WHERE` on SQLite, field comparison on the memory
/// store). Unknown field names are rejected by `add`; `eq` keeps chaining
/// and reports the first unknown field from `result`.
pub struct CriteriaSpecification<T: Entity> {
    executor: Option<Arc<dyn QueryExecutor<T>>>,
    query: Query<T>,
    unknown_field: Option<&'static str>,
}

impl<T: Entity> CriteriaSpecification<T> {
    pub fn new() -> Self {
        Self {
            executor: None,
            query: Query::new(),
            unknown_field: None,
        }
    }

    pub fn bind<U: UnitOfWork>(&mut self, unit_of_work: &U) {
        self.executor = Some(unit_of_work.queryable::<T>());
        self.query = Query::new();
        self.unknown_field = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.executor.is_some()
    }

    pub fn add(&mut self, criterion: Criterion) -> Result<&mut Self> {
        if !T::has_field(criterion.field) {
            return Err(unknown_field::<T>(criterion.field));
        }
        self.query.add_criterion(criterion);
        Ok(self)
    }

    /// Equality filter; an unknown `field` fails the next `result` call
    pub fn eq(&mut self, field: &'static str, value: impl Into<Value>) -> &mut Self {
        if !T::has_field(field) {
            self.unknown_field.get_or_insert(field);
            return self;
        }
        self.query
            .add_criterion(Criterion::new(field, CompareOp::Eq, value));
        self
    }

    pub fn result(&self) -> Result<SpecificationResult<T>> {
        let executor = self.executor.clone().ok_or(RepositoryError::NotInitialized(
            std::any::type_name::<Self>(),
        ))?;
        if let Some(field) = self.unknown_field {
            return Err(unknown_field::<T>(field));
        }
        Ok(SpecificationResult::new(executor, self.query.clone()))
    }
}

fn unknown_field<T: Entity>(field: &str) -> RepositoryError {
    RepositoryError::QueryShape(format!("{} has no field {}", T::NAME, field))
}

impl<T: Entity> Default for CriteriaSpecification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity, U: UnitOfWork> Specification<T, U> for CriteriaSpecification<T> {
    fn initialize(&mut self, unit_of_work: &U) -> Result<()> {
        self.bind(unit_of_work);
        Ok(())
    }

    fn to_result(&self) -> Result<SpecificationResult<T>> {
        self.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{JournalUnitOfWork, Note};

    fn notes() -> Vec<Note> {
        vec![
            Note { id: 1, body: "draft".into() },
            Note { id: 2, body: "final".into() },
        ]
    }

    #[tokio::test]
    async fn test_eq_filters_on_known_field() {
        let uow = JournalUnitOfWork::new(notes());
        let mut spec = CriteriaSpecification::<Note>::new();
        spec.bind(&uow);
        spec.eq("body", "final");

        let found = spec.result().unwrap().to_list().await.unwrap();
        assert_eq!(found, vec![Note { id: 2, body: "final".into() }]);
    }

    #[test]
    fn test_eq_on_unknown_field_fails_result() {
        let uow = JournalUnitOfWork::new(notes());
        let mut spec = CriteriaSpecification::<Note>::new();
        spec.bind(&uow);
        spec.eq("title", "final").eq("body", "final");

        match spec.result() {
            Err(RepositoryError::QueryShape(message)) => assert!(message.contains("title")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("unknown field was accepted"),
        }
    }

    #[test]
    fn test_add_rejects_unknown_field() {
        let mut spec = CriteriaSpecification::<Note>::new();
        let result = spec.add(Criterion::eq("title", "final"));
        assert!(matches!(result, Err(RepositoryError::QueryShape(_))));
    }
}
