// Application Layer - Repository facade, specifications and their locator

pub mod locator;
pub mod repository;
pub mod scope;
pub mod specification;

#[cfg(test)]
pub(crate) mod testing;

pub use locator::SpecificationLocator;
pub use repository::{GenericRepository, IdentityLookup, RepositoryBuilder};
pub use scope::run_in_transaction;
pub use specification::{
    CriteriaSpecification, QueryableSpecification, ResultPhase, Specification,
    SpecificationResult,
};
