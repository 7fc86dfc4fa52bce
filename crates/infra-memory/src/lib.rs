// Unitas In-Memory Adapter
// Deferred-submit: mutations stay in the session until flush/commit

pub mod factory;
pub mod options;
mod session;
pub mod store;
pub mod transaction;
pub mod unit_of_work;

pub use factory::MemoryUnitOfWorkFactory;
pub use options::MemoryOptions;
pub use store::MemoryStore;
pub use transaction::MemoryTransaction;
pub use unit_of_work::MemoryUnitOfWork;
