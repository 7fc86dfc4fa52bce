// Entity Mapping Boundary

use crate::domain::value::{Record, Value};
use crate::error::{RepositoryError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A persisted domain record with a client-assigned primary key
///
/// The entity's own field set stays with the domain; this trait only exposes
/// what the repository layer needs: a storage name, the key, the orderable
/// fields and a conversion to and from a [`Record`].
///
/// # Example
/// ```text
/// impl Entity for Customer {
///     type Key = String;
///     const NAME: &'static str = "customers";
///     const KEY_FIELD: &'static str = "id";
///     const FIELDS: &'static [&'static str] = &["id", "name", "age"];
///     ...
/// }
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    type Key: Clone + Into<Value> + Send + Sync + std::fmt::Debug;

    /// Table / collection name
    const NAME: &'static str;

    /// Primary key field, must be listed in `FIELDS`
    const KEY_FIELD: &'static str;

    /// Persisted fields in column order
    const FIELDS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    fn to_record(&self) -> Result<Record>;

    fn from_record(record: Record) -> Result<Self>;

    /// Reads a single field. Override when `to_record` is expensive.
    fn field(&self, name: &str) -> Option<Value> {
        self.to_record().ok()?.take(name)
    }

    fn key_value(&self) -> Value {
        self.key().into()
    }

    fn has_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }
}

/// Maps a serde-serializable entity to a [`Record`]
///
/// Only scalar members are allowed; nested structs or sequences fail with a
/// mapping error.
pub fn to_record<T: Serialize>(entity: &T) -> Result<Record> {
    match serde_json::to_value(entity)? {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| Value::from_json(value).map(|v| (name, v)))
            .collect(),
        other => Err(RepositoryError::Mapping(format!(
            "entity serialized to {} instead of an object",
            other
        ))),
    }
}

/// Rebuilds a serde-deserializable entity from a [`Record`]
///
/// Boolean members stored by SQLite come back as integers and need a
/// hand-written `from_record`.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    let mut map = serde_json::Map::with_capacity(record.len());
    for (name, value) in record.iter() {
        map.insert(name.to_string(), value.clone().into_json()?);
    }
    Ok(serde_json::from_value(serde_json::Value::Object(map))?)
}
