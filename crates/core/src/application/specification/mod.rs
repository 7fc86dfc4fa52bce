// Specifications - domain-named, fluent queries bound to one unit of work

pub mod criteria;
pub mod queryable;
pub mod result;

pub use criteria::CriteriaSpecification;
pub use queryable::QueryableSpecification;
pub use result::{ResultPhase, SpecificationResult};

use crate::domain::Entity;
use crate::error::Result;
use crate::port::UnitOfWork;

/// Base contract of every specification
///
/// Domain specifications extend this with fluent filter methods named after
/// the domain ("with_name", "with_age") that return the specification for
/// chaining. `initialize` binds the specification to a unit of work and must
/// run before filters are added; the repository's `specify` does this.
/// `to_result` snapshots the accumulated filters, so later filter calls do
/// not change a result already produced.
pub trait Specification<T: Entity, U: UnitOfWork>: Send {
    fn initialize(&mut self, unit_of_work: &U) -> Result<()>;

    fn to_result(&self) -> Result<SpecificationResult<T>>;
}

// Lets `Box<dyn DomainSpecification<U>>` be resolved and initialized like any
// concrete specification
impl<T, U, S> Specification<T, U> for Box<S>
where
    T: Entity,
    U: UnitOfWork,
    S: Specification<T, U> + ?Sized,
{
    fn initialize(&mut self, unit_of_work: &U) -> Result<()> {
        (**self).initialize(unit_of_work)
    }

    fn to_result(&self) -> Result<SpecificationResult<T>> {
        (**self).to_result()
    }
}
