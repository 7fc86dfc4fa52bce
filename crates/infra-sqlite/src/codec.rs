// Value <-> SQLite binding and row decoding

use crate::error::map_sqlx_error;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, QueryBuilder, Row, Sqlite, TypeInfo, ValueRef};
use unitas_core::domain::{Record, Value};
use unitas_core::error::{RepositoryError, Result};

/// Binds a [`Value`] as the next `?` placeholder
pub(crate) fn push_value(builder: &mut QueryBuilder<'static, Sqlite>, value: Value) {
    match value {
        Value::Null => builder.push_bind(Option::<i64>::None),
        Value::Boolean(flag) => builder.push_bind(flag),
        Value::Integer(number) => builder.push_bind(number),
        Value::Real(number) => builder.push_bind(number),
        Value::Text(text) => builder.push_bind(text),
    };
}

/// Decodes a row by each value's storage class
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Record> {
    let mut record = Record::new();

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(map_sqlx_error)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => {
                    Value::Integer(row.try_get::<i64, _>(index).map_err(map_sqlx_error)?)
                }
                "REAL" => Value::Real(row.try_get::<f64, _>(index).map_err(map_sqlx_error)?),
                "TEXT" => Value::Text(row.try_get::<String, _>(index).map_err(map_sqlx_error)?),
                other => {
                    return Err(RepositoryError::Mapping(format!(
                        "column {} has unsupported storage class {}",
                        column.name(),
                        other
                    )))
                }
            }
        };

        record.insert(column.name(), value);
    }

    Ok(record)
}
