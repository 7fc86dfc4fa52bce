// SQL statement builders

use crate::codec::push_value;
use sqlx::{QueryBuilder, Sqlite};
use unitas_core::domain::{Criterion, Entity, Query, Record, SortDirection, Value};

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn push_columns(builder: &mut QueryBuilder<'static, Sqlite>, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(quote(field));
    }
}

fn push_criterion(builder: &mut QueryBuilder<'static, Sqlite>, criterion: &Criterion) {
    builder.push(quote(criterion.field));
    builder.push(" ");
    builder.push(criterion.op.as_sql());
    if !criterion.op.is_unary() {
        builder.push(" ");
        push_value(builder, criterion.value.clone());
    }
}

pub(crate) fn insert<T: Entity>(record: &Record) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", quote(T::NAME)));
    push_columns(&mut builder, T::FIELDS);
    builder.push(") VALUES (");
    for (i, field) in T::FIELDS.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, record.value(field));
    }
    builder.push(")");
    builder
}

pub(crate) fn update<T: Entity>(record: &Record, key: Value) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", quote(T::NAME)));
    let columns = T::FIELDS.iter().filter(|field| **field != T::KEY_FIELD);
    for (i, field) in columns.enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(format!("{} = ", quote(field)));
        push_value(&mut builder, record.value(field));
    }
    builder.push(format!(" WHERE {} = ", quote(T::KEY_FIELD)));
    push_value(&mut builder, key);
    builder
}

pub(crate) fn delete<T: Entity>(key: Value) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(format!(
        "DELETE FROM {} WHERE {} = ",
        quote(T::NAME),
        quote(T::KEY_FIELD)
    ));
    push_value(&mut builder, key);
    builder
}

/// SELECT for a query plan
///
/// With closure predicates present only the criteria are pushed down; the
/// caller evaluates the full plan over the returned rows.
pub(crate) fn select<T: Entity>(query: &Query<T>) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT ");
    push_columns(&mut builder, T::FIELDS);
    builder.push(format!(" FROM {}", quote(T::NAME)));

    for (i, criterion) in query.criteria().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_criterion(&mut builder, criterion);
    }

    if query.has_predicates() {
        return builder;
    }

    for (i, key) in query.ordering().iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        builder.push(quote(key.field));
        builder.push(match key.direction {
            SortDirection::Ascending => " ASC",
            SortDirection::Descending => " DESC",
        });
    }

    match (query.limit(), query.offset()) {
        (Some(limit), offset) => {
            builder.push(" LIMIT ");
            builder.push_bind(sql_bound(limit));
            builder.push(" OFFSET ");
            builder.push_bind(sql_bound(offset));
        }
        // SQLite has no OFFSET without LIMIT; -1 means unbounded
        (None, offset) if offset > 0 => {
            builder.push(" LIMIT -1 OFFSET ");
            builder.push_bind(sql_bound(offset));
        }
        (None, _) => {}
    }

    builder
}

/// SQLite reads a negative OFFSET as zero, so large bounds clamp instead of wrapping
fn sql_bound(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
