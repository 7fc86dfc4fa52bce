// Unit of Work Factory port

use crate::error::Result;
use crate::port::unit_of_work::UnitOfWork;
use async_trait::async_trait;

/// Opens and closes units of work; the only long-lived shared object
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    type UnitOfWork: UnitOfWork;

    async fn begin_unit_of_work(&self) -> Result<Self::UnitOfWork>;

    /// Close a unit of work; `None` is tolerated
    async fn end_unit_of_work(&self, unit_of_work: Option<Self::UnitOfWork>) -> Result<()> {
        match unit_of_work {
            Some(uow) => uow.close().await,
            None => Ok(()),
        }
    }

    /// Release the factory's native resources; later `begin_unit_of_work`
    /// calls fail
    async fn close(&self) -> Result<()>;
}
