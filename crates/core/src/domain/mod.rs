// Domain Layer - Entity mapping, values and the query plan

pub mod entity;
pub mod query;
pub mod value;

// Re-exports
pub use entity::{from_record, to_record, Entity};
pub use query::{member_field, CompareOp, Criterion, Predicate, Query, SortDirection, SortKey};
pub use value::{Record, Value};
