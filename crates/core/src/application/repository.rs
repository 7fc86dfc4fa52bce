// Generic Repository - CRUD + specifications over one unit of work

use crate::application::locator::SpecificationLocator;
use crate::application::specification::Specification;
use crate::domain::Entity;
use crate::error::{RepositoryError, Result};
use crate::port::UnitOfWork;
use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Matches an entity against a primary key
pub type IdentityLookup<T> = Arc<dyn Fn(&T, &<T as Entity>::Key) -> bool + Send + Sync>;

/// Repository facade application code works against
///
/// The repository borrows its unit of work and locator and never closes
/// them; flushing and disposal stay with the caller that opened the unit of
/// work. All CRUD calls delegate to the unit of work for the repository's
/// entity type.
///
/// # Example
/// ```text
/// let uow = factory.begin_unit_of_work().await?;
/// let customers = GenericRepository::<Customer, _>::new(&uow, &locator);
/// customers.insert(&customer).await?;
/// uow.flush().await?;
/// ```
pub struct GenericRepository<'a, T: Entity, U: UnitOfWork> {
    unit_of_work: &'a U,
    locator: &'a SpecificationLocator,
    identity: Option<IdentityLookup<T>>,
}

impl<'a, T: Entity, U: UnitOfWork> GenericRepository<'a, T, U> {
    pub fn new(unit_of_work: &'a U, locator: &'a SpecificationLocator) -> Self {
        Self {
            unit_of_work,
            locator,
            identity: None,
        }
    }

    pub fn builder() -> RepositoryBuilder<'a, T, U> {
        RepositoryBuilder::default()
    }

    /// Supplies the identity predicate used by `get_by_id` on backends that
    /// have no generic lookup by key
    pub fn with_identity_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&T, &T::Key) -> bool + Send + Sync + 'static,
    {
        self.identity = Some(Arc::new(lookup));
        self
    }

    pub fn unit_of_work(&self) -> &'a U {
        self.unit_of_work
    }

    pub async fn insert(&self, entity: &T) -> Result<()> {
        self.unit_of_work.insert(entity).await
    }

    pub async fn update(&self, entity: &T) -> Result<()> {
        self.unit_of_work.update(entity).await
    }

    pub async fn delete(&self, entity: &T) -> Result<()> {
        self.unit_of_work.delete(entity).await
    }

    /// `None` when no entity has the key
    pub async fn get_by_id(&self, id: &T::Key) -> Result<Option<T>> {
        if self.unit_of_work.supports_generic_get_by_id() {
            return self.unit_of_work.get_by_id::<T>(id).await;
        }

        match &self.identity {
            Some(lookup) => {
                debug!(entity = T::NAME, id = ?id, "Lookup by identity predicate");
                Ok(self
                    .unit_of_work
                    .get_all::<T>()
                    .await?
                    .into_iter()
                    .find(|entity| lookup(entity, id)))
            }
            None => self.unit_of_work.get_by_id::<T>(id).await,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<T>> {
        self.unit_of_work.get_all::<T>().await
    }

    /// Resolves `S` from the locator and binds it to this repository's unit
    /// of work
    ///
    /// Specifications resolved from the same repository share the session
    /// and see each other's unflushed mutations.
    pub fn specify<S>(&self) -> Result<S>
    where
        S: Specification<T, U> + 'static,
    {
        let mut specification = self.locator.resolve::<S, T>().map_err(|source| {
            RepositoryError::Resolution {
                specification: type_name::<S>(),
                entity: type_name::<T>(),
                source,
            }
        })?;

        specification.initialize(self.unit_of_work)?;
        Ok(specification)
    }
}

/// Builder that reports missing dependencies instead of panicking
pub struct RepositoryBuilder<'a, T: Entity, U: UnitOfWork> {
    unit_of_work: Option<&'a U>,
    locator: Option<&'a SpecificationLocator>,
    identity: Option<IdentityLookup<T>>,
    _entity: PhantomData<T>,
}

impl<'a, T: Entity, U: UnitOfWork> Default for RepositoryBuilder<'a, T, U> {
    fn default() -> Self {
        Self {
            unit_of_work: None,
            locator: None,
            identity: None,
            _entity: PhantomData,
        }
    }
}

impl<'a, T: Entity, U: UnitOfWork> RepositoryBuilder<'a, T, U> {
    pub fn unit_of_work(mut self, unit_of_work: &'a U) -> Self {
        self.unit_of_work = Some(unit_of_work);
        self
    }

    pub fn locator(mut self, locator: &'a SpecificationLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn identity_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&T, &T::Key) -> bool + Send + Sync + 'static,
    {
        self.identity = Some(Arc::new(lookup));
        self
    }

    pub fn build(self) -> Result<GenericRepository<'a, T, U>> {
        let unit_of_work = self
            .unit_of_work
            .ok_or(RepositoryError::MissingArgument("unit_of_work"))?;
        let locator = self
            .locator
            .ok_or(RepositoryError::MissingArgument("specification_locator"))?;

        Ok(GenericRepository {
            unit_of_work,
            locator,
            identity: self.identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::specification::QueryableSpecification;
    use crate::application::testing::{JournalUnitOfWork, Note};
    use crate::error::ResolutionError;

    fn notes() -> Vec<Note> {
        vec![
            Note {
                id: 1,
                body: "first".to_string(),
            },
            Note {
                id: 2,
                body: "second".to_string(),
            },
        ]
    }

    #[test]
    fn test_builder_reports_missing_dependencies() {
        let uow = JournalUnitOfWork::new(Vec::new());
        let locator = SpecificationLocator::new();

        let result = GenericRepository::<Note, JournalUnitOfWork>::builder()
            .locator(&locator)
            .build();
        assert!(matches!(
            result,
            Err(RepositoryError::MissingArgument("unit_of_work"))
        ));

        let result = GenericRepository::<Note, JournalUnitOfWork>::builder()
            .unit_of_work(&uow)
            .build();
        assert!(matches!(
            result,
            Err(RepositoryError::MissingArgument("specification_locator"))
        ));
    }

    #[tokio::test]
    async fn test_crud_delegates_to_unit_of_work() {
        let uow = JournalUnitOfWork::new(notes());
        let locator = SpecificationLocator::new();
        let repository = GenericRepository::<Note, _>::new(&uow, &locator);

        let note = notes().remove(0);
        repository.insert(&note).await.unwrap();
        repository.update(&note).await.unwrap();
        repository.delete(&note).await.unwrap();
        assert_eq!(repository.get_all().await.unwrap().len(), 2);

        assert_eq!(
            uow.journal.entries(),
            vec!["insert", "update", "delete", "get_all"]
        );
    }

    #[tokio::test]
    async fn test_get_by_id_falls_back_to_identity_lookup() {
        let uow = JournalUnitOfWork::new(notes());
        let locator = SpecificationLocator::new();

        let bare = GenericRepository::<Note, _>::new(&uow, &locator);
        assert!(matches!(
            bare.get_by_id(&2).await,
            Err(RepositoryError::NotSupported(_))
        ));

        let repository = GenericRepository::<Note, _>::new(&uow, &locator)
            .with_identity_lookup(|note: &Note, id: &i64| note.id == *id);
        let found = repository.get_by_id(&2).await.unwrap();
        assert_eq!(found.map(|n| n.body), Some("second".to_string()));
        assert_eq!(repository.get_by_id(&9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_specify_initializes_resolved_specification() {
        let uow = JournalUnitOfWork::new(notes());
        let locator = SpecificationLocator::new().register::<Note, QueryableSpecification<Note>, _>(
            || Ok(QueryableSpecification::new()),
        );
        let repository = GenericRepository::<Note, _>::new(&uow, &locator);

        let mut specification = repository.specify::<QueryableSpecification<Note>>().unwrap();
        assert!(specification.is_initialized());

        specification.filter(|note: &Note| note.id > 1);
        let found = specification.result().unwrap().single().await.unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_specify_wraps_resolution_failure() {
        let uow = JournalUnitOfWork::new(Vec::new());
        let locator = SpecificationLocator::new();
        let repository = GenericRepository::<Note, _>::new(&uow, &locator);

        match repository.specify::<QueryableSpecification<Note>>() {
            Err(RepositoryError::Resolution {
                specification,
                entity,
                source: ResolutionError::NotRegistered(_),
            }) => {
                assert!(specification.contains("QueryableSpecification"));
                assert!(entity.contains("Note"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("unregistered specification resolved"),
        }
    }
}
