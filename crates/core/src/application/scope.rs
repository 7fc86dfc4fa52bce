// Transaction scope helper

use crate::error::Result;
use crate::port::{Transaction, UnitOfWork};
use std::future::Future;
use tracing::warn;

/// Runs `work` inside a transaction of `unit_of_work`
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`. If the
/// future is dropped or panics midway, the transaction's own drop rolls it
/// back, so every exit path releases the scope.
///
/// # Example
/// ```text
/// run_in_transaction(&uow, || async {
///     customers.insert(&first).await?;
///     customers.insert(&second).await
/// })
/// .await?;
/// ```
pub async fn run_in_transaction<U, F, Fut, R>(unit_of_work: &U, work: F) -> Result<R>
where
    U: UnitOfWork,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let transaction = unit_of_work.begin_transaction().await?;

    match work().await {
        Ok(value) => {
            transaction.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed unit of work step failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{JournalUnitOfWork, Note};
    use crate::error::RepositoryError;

    fn note(id: i64) -> Note {
        Note {
            id,
            body: "draft".to_string(),
        }
    }

    #[tokio::test]
    async fn test_commits_when_work_succeeds() {
        let uow = JournalUnitOfWork::new(Vec::new());

        let value = run_in_transaction(&uow, || async {
            uow.insert(&note(1)).await?;
            Ok(7)
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(uow.journal.entries(), vec!["begin", "insert", "commit"]);
    }

    #[tokio::test]
    async fn test_rolls_back_and_returns_work_error() {
        let uow = JournalUnitOfWork::new(Vec::new());

        let result = run_in_transaction(&uow, || async {
            uow.insert(&note(1)).await?;
            Err::<(), _>(RepositoryError::Conflict("stale note".to_string()))
        })
        .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(uow.journal.entries(), vec!["begin", "insert", "rollback"]);
    }
}
