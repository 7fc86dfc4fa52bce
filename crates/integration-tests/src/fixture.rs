// Backend fixtures - one factory, locator and id source per test

use crate::customer::{same_customer, Customer, CUSTOMERS_DDL};
use crate::init_tracing;
use crate::specification::{
    criteria_customer_specification, queryable_customer_specification, DynCustomerSpecification,
};
use tempfile::TempDir;
use tracing::debug;
use unitas_core::application::{GenericRepository, SpecificationLocator};
use unitas_core::error::{RepositoryError, Result};
use unitas_core::port::{IdProvider, SequenceIdProvider, UnitOfWork, UnitOfWorkFactory};
use unitas_infra_memory::{MemoryOptions, MemoryUnitOfWorkFactory};
use unitas_infra_sqlite::{SqliteSettings, SqliteUnitOfWorkFactory};

/// Which customer specification implementation the locator hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificationStyle {
    Queryable,
    Criteria,
}

/// Locator with the customer specification registered for unit of work `U`
pub fn customer_locator<U: UnitOfWork>(style: SpecificationStyle) -> SpecificationLocator {
    let locator = SpecificationLocator::new();
    match style {
        SpecificationStyle::Queryable => locator
            .register::<Customer, DynCustomerSpecification<U>, _>(
                queryable_customer_specification::<U>,
            ),
        SpecificationStyle::Criteria => locator
            .register::<Customer, DynCustomerSpecification<U>, _>(
                criteria_customer_specification::<U>,
            ),
    }
}

pub struct Fixture<F: UnitOfWorkFactory> {
    pub factory: F,
    pub locator: SpecificationLocator,
    ids: SequenceIdProvider,
    // keeps the SQLite database file alive
    _dir: Option<TempDir>,
}

impl<F: UnitOfWorkFactory> Fixture<F> {
    fn new(factory: F, style: SpecificationStyle, dir: Option<TempDir>) -> Self {
        Self {
            factory,
            locator: customer_locator::<F::UnitOfWork>(style),
            ids: SequenceIdProvider::new("customer"),
            _dir: dir,
        }
    }

    /// New customer with the next sequential id
    pub fn customer(&self, name: &str, age: i64) -> Customer {
        Customer::new(self.ids.generate_id(), name, age)
    }

    pub async fn begin(&self) -> Result<F::UnitOfWork> {
        self.factory.begin_unit_of_work().await
    }

    /// Customer repository with the identity predicate for `get_by_id`
    pub fn repository<'a>(
        &'a self,
        unit_of_work: &'a F::UnitOfWork,
    ) -> GenericRepository<'a, Customer, F::UnitOfWork> {
        GenericRepository::new(unit_of_work, &self.locator).with_identity_lookup(same_customer)
    }

    /// Persists customers through their own flushed unit of work
    pub async fn seed(&self, customers: &[Customer]) -> Result<()> {
        let unit_of_work = self.begin().await?;
        for customer in customers {
            unit_of_work.insert(customer).await?;
        }
        unit_of_work.flush().await?;
        debug!(count = customers.len(), "Seeded customers");
        self.factory.end_unit_of_work(Some(unit_of_work)).await
    }

    /// Customers visible to a freshly opened unit of work
    pub async fn durable_customers(&self) -> Result<Vec<Customer>> {
        let unit_of_work = self.begin().await?;
        let customers = unit_of_work.get_all::<Customer>().await?;
        self.factory.end_unit_of_work(Some(unit_of_work)).await?;
        Ok(customers)
    }
}

pub async fn memory_fixture(
    options: MemoryOptions,
    style: SpecificationStyle,
) -> Result<Fixture<MemoryUnitOfWorkFactory>> {
    init_tracing();
    Ok(Fixture::new(MemoryUnitOfWorkFactory::new(options), style, None))
}

/// File-backed database in a temporary directory
///
/// Every pooled `sqlite::memory:` connection would see its own empty
/// database, so fixtures always use a file.
pub async fn sqlite_fixture(style: SpecificationStyle) -> Result<Fixture<SqliteUnitOfWorkFactory>> {
    init_tracing();
    let dir = tempfile::tempdir().map_err(|e| RepositoryError::Config(e.to_string()))?;
    let settings = SqliteSettings {
        max_connections: 5,
        ..SqliteSettings::new(format!("sqlite://{}", dir.path().join("customers.db").display()))
    };

    let factory = SqliteUnitOfWorkFactory::connect(&settings).await?;
    sqlx::query(CUSTOMERS_DDL)
        .execute(factory.pool())
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    debug!(path = %dir.path().display(), "Customer schema ready");

    Ok(Fixture::new(factory, style, Some(dir)))
}
