// Unitas Core - Session, Transaction & Query Contracts
// NO storage dependencies: adapters live in the infra-* crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{RepositoryError, ResolutionError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
