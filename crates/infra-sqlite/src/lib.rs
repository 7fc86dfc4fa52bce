// Unitas Infrastructure - SQLite Adapter
// Eager-write sessions: mutations execute immediately inside a lazily opened
// session transaction, flush commits it, nested transactions are savepoints

mod codec;
mod connection;
mod error;
mod factory;
mod session;
mod settings;
mod sql;
mod transaction;
mod unit_of_work;

pub use connection::create_pool;
pub use factory::SqliteUnitOfWorkFactory;
pub use settings::SqliteSettings;
pub use transaction::SqliteTransaction;
pub use unit_of_work::SqliteUnitOfWork;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for RepositoryError here)

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{SqliteSettings, SqliteUnitOfWorkFactory};
    use tempfile::TempDir;

    /// Factory over a fresh file database with a `gadgets` table
    ///
    /// The directory guard must outlive the factory.
    pub async fn gadget_factory() -> (TempDir, SqliteUnitOfWorkFactory) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("unitas.db").display());
        let factory = SqliteUnitOfWorkFactory::connect(&SqliteSettings::new(url))
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE gadgets (id INTEGER PRIMARY KEY, label TEXT NOT NULL, price REAL)",
        )
        .execute(factory.pool())
        .await
        .unwrap();

        (dir, factory)
    }
}
