// Transaction port

use crate::error::Result;
use async_trait::async_trait;

/// Transaction scope owned by exactly one unit of work
///
/// Dropping a transaction that was never committed rolls its mutations
/// back; `rollback` only makes that explicit and lets the caller observe
/// errors. Committing consumes the transaction, so a committed scope can
/// never be rolled back by a later drop.
///
/// # Example
/// ```text
/// let tx = uow.begin_transaction().await?;
/// repository.insert(&customer).await?;
/// tx.commit().await?;
/// ```
#[async_trait]
pub trait Transaction: Send + 'static {
    /// Flush the owning unit of work, then finalize the scope
    async fn commit(self) -> Result<()>;

    /// Discard every mutation staged since the scope began
    async fn rollback(self) -> Result<()>;
}
