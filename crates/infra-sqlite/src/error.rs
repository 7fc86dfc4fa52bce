// sqlx error classification

use unitas_core::error::RepositoryError;

/// Map sqlx::Error to RepositoryError with SQLite-specific handling
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => RepositoryError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "787" | "3850" => RepositoryError::Database(format!(
                        "Foreign key constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => RepositoryError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => {
                        RepositoryError::Database(format!("Database full: {}", db_err.message()))
                    }
                    _ => RepositoryError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                RepositoryError::Database(db_err.message().to_string())
            }
        }
        sqlx::Error::ColumnDecode { index, source } => {
            RepositoryError::Mapping(format!("column {index}: {source}"))
        }
        sqlx::Error::ColumnNotFound(column) => {
            RepositoryError::Mapping(format!("column {column} not found"))
        }
        sqlx::Error::PoolClosed => {
            RepositoryError::InvalidState("unit of work factory is closed".to_string())
        }
        _ => RepositoryError::Database(err.to_string()),
    }
}
