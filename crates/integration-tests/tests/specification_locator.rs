//! Specification locator wiring through the repository

use std::error::Error as _;
use unitas_core::application::{GenericRepository, Specification, SpecificationLocator};
use unitas_core::error::{RepositoryError, ResolutionError};
use unitas_core::port::UnitOfWorkFactory;
use unitas_infra_memory::{MemoryOptions, MemoryUnitOfWork};
use unitas_integration_tests::{
    criteria_customer_specification, customer_locator, memory_fixture,
    queryable_customer_specification, Customer, CustomerSpecification, DynCustomerSpecification,
    SpecificationStyle,
};

type Spec = DynCustomerSpecification<MemoryUnitOfWork>;

#[test]
fn test_customer_locator_registers_one_factory() {
    for style in [SpecificationStyle::Queryable, SpecificationStyle::Criteria] {
        let locator = customer_locator::<MemoryUnitOfWork>(style);
        assert!(locator.is_registered::<Spec, Customer>());
    }
}

#[tokio::test]
async fn test_every_specify_builds_a_fresh_specification() {
    let fx = memory_fixture(MemoryOptions::default(), SpecificationStyle::Criteria)
        .await
        .unwrap();
    fx.seed(&[fx.customer("Ada", 36), fx.customer("Grace", 45)])
        .await
        .unwrap();

    let uow = fx.begin().await.unwrap();
    let customers = fx.repository(&uow);

    let mut narrowed = customers.specify::<Spec>().unwrap();
    narrowed.with_name("Ada");
    let fresh = customers.specify::<Spec>().unwrap();

    assert_eq!(narrowed.to_result().unwrap().to_list().await.unwrap().len(), 1);
    assert_eq!(fresh.to_result().unwrap().to_list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_ambiguous_registration_is_wrapped() {
    let fx = memory_fixture(MemoryOptions::default(), SpecificationStyle::Queryable)
        .await
        .unwrap();
    let locator = SpecificationLocator::new()
        .register::<Customer, Spec, _>(queryable_customer_specification::<MemoryUnitOfWork>)
        .register::<Customer, Spec, _>(criteria_customer_specification::<MemoryUnitOfWork>);

    let uow = fx.factory.begin_unit_of_work().await.unwrap();
    let customers = GenericRepository::<Customer, _>::new(&uow, &locator);

    match customers.specify::<Spec>() {
        Err(err @ RepositoryError::Resolution { .. }) => {
            let cause = err.source().map(|source| source.to_string());
            assert!(cause.is_some_and(|cause| cause.contains("2 registrations")));
            assert!(matches!(
                err,
                RepositoryError::Resolution {
                    source: ResolutionError::Ambiguous { .. },
                    ..
                }
            ));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("ambiguous registration resolved"),
    }
}

#[tokio::test]
async fn test_construction_failure_is_wrapped() {
    let fx = memory_fixture(MemoryOptions::default(), SpecificationStyle::Queryable)
        .await
        .unwrap();
    let locator = SpecificationLocator::new().register::<Customer, Spec, _>(|| {
        Err(RepositoryError::Config("customer index unavailable".to_string()))
    });

    let uow = fx.factory.begin_unit_of_work().await.unwrap();
    let result = GenericRepository::<Customer, _>::new(&uow, &locator).specify::<Spec>();

    assert!(matches!(
        result,
        Err(RepositoryError::Resolution {
            source: ResolutionError::Construction(_),
            ..
        })
    ));
}

#[test]
fn test_unbound_specification_reports_not_initialized() {
    let spec = queryable_customer_specification::<MemoryUnitOfWork>().unwrap();
    assert!(matches!(
        spec.to_result(),
        Err(RepositoryError::NotInitialized(_))
    ));
}
