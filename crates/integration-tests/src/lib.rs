// Unitas Integration Tests - Customer sample domain and backend fixtures

pub mod customer;
pub mod fixture;
pub mod specification;

pub use customer::{same_customer, Customer, CUSTOMERS_DDL};
pub use fixture::{customer_locator, memory_fixture, sqlite_fixture, Fixture, SpecificationStyle};
pub use specification::{
    criteria_customer_specification, queryable_customer_specification,
    CriteriaCustomerSpecification, CustomerSpecification, DynCustomerSpecification,
    QueryableCustomerSpecification,
};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a test-writer subscriber once per test binary
///
/// `UNITAS_LOG` wins over `RUST_LOG`; the default is `unitas=info`.
/// `UNITAS_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("UNITAS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("unitas=info"));

    let json = std::env::var("UNITAS_LOG_FORMAT").is_ok_and(|format| format == "json");
    let registry = tracing_subscriber::registry().with(env_filter);

    // a second call finds the global subscriber already set
    let _ = if json {
        registry.with(fmt::layer().json().with_test_writer()).try_init()
    } else {
        registry.with(fmt::layer().with_test_writer()).try_init()
    };
}
