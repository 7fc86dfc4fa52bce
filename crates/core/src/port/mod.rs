// Port Layer - Interfaces storage adapters implement

pub mod factory;
pub mod id_provider; // For deterministic testing
pub mod query_executor;
pub mod transaction;
pub mod unit_of_work;

// Re-exports
pub use factory::UnitOfWorkFactory;
pub use id_provider::{IdProvider, SequenceIdProvider, UuidProvider};
pub use query_executor::QueryExecutor;
pub use transaction::Transaction;
pub use unit_of_work::{Capabilities, UnitOfWork};
