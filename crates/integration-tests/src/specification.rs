// Customer specifications - one domain contract, two backend styles

use crate::customer::Customer;
use unitas_core::application::{
    CriteriaSpecification, QueryableSpecification, Specification, SpecificationResult,
};
use unitas_core::error::Result;
use unitas_core::port::UnitOfWork;

/// Domain-named filters over customers
pub trait CustomerSpecification<U: UnitOfWork>: Specification<Customer, U> {
    fn with_name(&mut self, name: &str) -> &mut dyn CustomerSpecification<U>;

    fn with_age(&mut self, age: i64) -> &mut dyn CustomerSpecification<U>;
}

/// The type repositories request from the locator
pub type DynCustomerSpecification<U> = Box<dyn CustomerSpecification<U>>;

/// Closure filters, evaluated client-side
#[derive(Default)]
pub struct QueryableCustomerSpecification {
    inner: QueryableSpecification<Customer>,
}

impl<U: UnitOfWork> Specification<Customer, U> for QueryableCustomerSpecification {
    fn initialize(&mut self, unit_of_work: &U) -> Result<()> {
        self.inner.bind(unit_of_work);
        Ok(())
    }

    fn to_result(&self) -> Result<SpecificationResult<Customer>> {
        self.inner.result()
    }
}

impl<U: UnitOfWork> CustomerSpecification<U> for QueryableCustomerSpecification {
    fn with_name(&mut self, name: &str) -> &mut dyn CustomerSpecification<U> {
        let name = name.to_string();
        self.inner.filter(move |customer: &Customer| customer.name == name);
        self
    }

    fn with_age(&mut self, age: i64) -> &mut dyn CustomerSpecification<U> {
        self.inner.filter(move |customer: &Customer| customer.age == age);
        self
    }
}

/// Field criteria, pushed into the storage engine
#[derive(Default)]
pub struct CriteriaCustomerSpecification {
    inner: CriteriaSpecification<Customer>,
}

impl<U: UnitOfWork> Specification<Customer, U> for CriteriaCustomerSpecification {
    fn initialize(&mut self, unit_of_work: &U) -> Result<()> {
        self.inner.bind(unit_of_work);
        Ok(())
    }

    fn to_result(&self) -> Result<SpecificationResult<Customer>> {
        self.inner.result()
    }
}

impl<U: UnitOfWork> CustomerSpecification<U> for CriteriaCustomerSpecification {
    fn with_name(&mut self, name: &str) -> &mut dyn CustomerSpecification<U> {
        self.inner.eq("name", name);
        self
    }

    fn with_age(&mut self, age: i64) -> &mut dyn CustomerSpecification<U> {
        self.inner.eq("age", age);
        self
    }
}

pub fn queryable_customer_specification<U: UnitOfWork>() -> Result<DynCustomerSpecification<U>> {
    Ok(Box::new(QueryableCustomerSpecification::default()))
}

pub fn criteria_customer_specification<U: UnitOfWork>() -> Result<DynCustomerSpecification<U>> {
    Ok(Box::new(CriteriaCustomerSpecification::default()))
}
