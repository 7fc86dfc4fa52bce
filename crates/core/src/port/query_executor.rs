// Query Executor port

use crate::domain::{Entity, Query};
use crate::error::Result;
use async_trait::async_trait;

/// Executes a query plan against a live session
///
/// Implementations must honor filter -> order -> skip -> take exactly,
/// falling back to client-side evaluation for anything the native engine
/// can not express.
#[async_trait]
pub trait QueryExecutor<T: Entity>: Send + Sync {
    async fn execute(&self, query: &Query<T>) -> Result<Vec<T>>;
}
