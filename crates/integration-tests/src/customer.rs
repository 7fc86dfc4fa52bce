// Customer - sample entity for the repository suites

use serde::{Deserialize, Serialize};
use unitas_core::domain::{self, Entity, Record};
use unitas_core::error::Result;

/// Schema the SQLite fixtures create; the layer itself never manages schema
pub const CUSTOMERS_DDL: &str = "CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL
)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub age: i64,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
        }
    }
}

impl Entity for Customer {
    type Key = String;
    const NAME: &'static str = "customers";
    const KEY_FIELD: &'static str = "id";
    const FIELDS: &'static [&'static str] = &["id", "name", "age"];

    fn key(&self) -> String {
        self.id.clone()
    }

    fn to_record(&self) -> Result<Record> {
        domain::to_record(self)
    }

    fn from_record(record: Record) -> Result<Self> {
        domain::from_record(record)
    }
}

/// Identity predicate for repositories over predicate-only backends
pub fn same_customer(customer: &Customer, id: &String) -> bool {
    &customer.id == id
}
