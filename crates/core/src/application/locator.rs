// Specification Locator - explicit registry of specification factories

use crate::domain::Entity;
use crate::error::{RepositoryError, ResolutionError};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use tracing::debug;

type SpecificationFactory<S> = Box<dyn Fn() -> crate::Result<S> + Send + Sync>;

struct Registration {
    factory: Box<dyn Any + Send + Sync>,
}

/// Maps (entity, requested specification type) to a factory
///
/// Built once at startup and shared read-only afterwards. Every `resolve`
/// call constructs a fresh instance; nothing is cached between calls.
///
/// # Example
/// ```text
/// let locator = SpecificationLocator::new()
///     .register::<Customer, Box<dyn CustomerSpecification<SqliteUnitOfWork>>, _>(|| {
///         Ok(Box::new(CriteriaCustomerSpecification::new()))
///     });
/// ```
#[derive(Default)]
pub struct SpecificationLocator {
    registrations: HashMap<(TypeId, TypeId), Vec<Registration>>,
}

impl SpecificationLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `S` on entity `T`
    ///
    /// Registering the same pair twice makes later resolution ambiguous.
    pub fn register<T, S, F>(mut self, factory: F) -> Self
    where
        T: Entity,
        S: Send + 'static,
        F: Fn() -> crate::Result<S> + Send + Sync + 'static,
    {
        debug!(
            entity = T::NAME,
            specification = type_name::<S>(),
            "Registering specification"
        );
        let factory: SpecificationFactory<S> = Box::new(factory);
        self.registrations
            .entry((TypeId::of::<T>(), TypeId::of::<S>()))
            .or_default()
            .push(Registration {
                factory: Box::new(factory),
            });
        self
    }

    pub fn is_registered<S: 'static, T: Entity>(&self) -> bool {
        self.registrations
            .contains_key(&(TypeId::of::<T>(), TypeId::of::<S>()))
    }

    /// Constructs a new `S` for entity `T`
    pub fn resolve<S: 'static, T: Entity>(&self) -> Result<S, ResolutionError> {
        let specification = type_name::<S>();
        let registrations = self
            .registrations
            .get(&(TypeId::of::<T>(), TypeId::of::<S>()))
            .ok_or(ResolutionError::NotRegistered(specification))?;

        let registration = match registrations.as_slice() {
            [single] => single,
            [] => return Err(ResolutionError::NotRegistered(specification)),
            many => {
                return Err(ResolutionError::Ambiguous {
                    specification,
                    registrations: many.len(),
                })
            }
        };

        let factory = registration
            .factory
            .downcast_ref::<SpecificationFactory<S>>()
            .ok_or(ResolutionError::NotRegistered(specification))?;

        factory().map_err(|e: RepositoryError| ResolutionError::Construction(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct Note;

    impl Entity for Note {
        type Key = i64;
        const NAME: &'static str = "notes";
        const KEY_FIELD: &'static str = "id";
        const FIELDS: &'static [&'static str] = &["id"];

        fn key(&self) -> i64 {
            0
        }

        fn to_record(&self) -> crate::Result<Record> {
            Ok(Record::new().with("id", 0))
        }

        fn from_record(_: Record) -> crate::Result<Self> {
            Ok(Note)
        }
    }

    #[derive(Debug)]
    struct RecentNotes(usize);

    #[derive(Debug)]
    struct PinnedNotes;

    #[test]
    fn test_resolve_constructs_fresh_instances() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let locator = SpecificationLocator::new().register::<Note, RecentNotes, _>(move || {
            Ok(RecentNotes(counter.fetch_add(1, Ordering::SeqCst)))
        });

        let first = locator.resolve::<RecentNotes, Note>().unwrap();
        let second = locator.resolve::<RecentNotes, Note>().unwrap();
        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
    }

    #[test]
    fn test_unregistered_specification() {
        let locator = SpecificationLocator::new();
        let err = locator.resolve::<PinnedNotes, Note>().unwrap_err();
        assert!(matches!(err, ResolutionError::NotRegistered(_)));
    }

    #[test]
    fn test_duplicate_registration_is_ambiguous() {
        let locator = SpecificationLocator::new()
            .register::<Note, PinnedNotes, _>(|| Ok(PinnedNotes))
            .register::<Note, PinnedNotes, _>(|| Ok(PinnedNotes));

        let err = locator.resolve::<PinnedNotes, Note>().unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::Ambiguous {
                registrations: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_construction_failure_is_wrapped() {
        let locator = SpecificationLocator::new().register::<Note, PinnedNotes, _>(|| {
            Err(RepositoryError::Config("index missing".to_string()))
        });

        let err = locator.resolve::<PinnedNotes, Note>().unwrap_err();
        assert!(matches!(err, ResolutionError::Construction(_)));
    }
}
