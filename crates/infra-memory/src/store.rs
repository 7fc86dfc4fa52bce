// Shared in-memory store (the "database" every session flushes into)

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use unitas_core::domain::{Record, Value};
use unitas_core::error::{RepositoryError, Result};

/// Rows of one entity, keyed by primary key
pub(crate) type Table = BTreeMap<Value, Record>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One mutation waiting for flush
#[derive(Debug, Clone)]
pub(crate) struct StagedChange {
    pub entity: &'static str,
    pub key: Value,
    pub kind: ChangeKind,
    pub record: Record,
}

/// Durable side of the memory backend
///
/// Shared by every unit of work a factory opens. Flushes are applied
/// all-or-nothing under the write lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durable row count for an entity name
    pub fn row_count(&self, entity: &str) -> usize {
        self.tables.read().get(entity).map_or(0, |t| t.len())
    }

    /// Durable rows overlaid with a session's staged changes
    pub(crate) fn view(&self, entity: &str, staged: &[StagedChange]) -> Table {
        let mut table = self.tables.read().get(entity).cloned().unwrap_or_default();

        for change in staged.iter().filter(|c| c.entity == entity) {
            match change.kind {
                ChangeKind::Insert | ChangeKind::Update => {
                    table.insert(change.key.clone(), change.record.clone());
                }
                ChangeKind::Delete => {
                    table.remove(&change.key);
                }
            }
        }
        table
    }

    /// Applies every change or none of them
    pub(crate) fn apply(&self, changes: &[StagedChange]) -> Result<()> {
        let mut tables = self.tables.write();
        let mut working: HashMap<&'static str, Table> = HashMap::new();

        for change in changes {
            let table = working
                .entry(change.entity)
                .or_insert_with(|| tables.get(change.entity).cloned().unwrap_or_default());

            match change.kind {
                ChangeKind::Insert => {
                    if table.contains_key(&change.key) {
                        return Err(RepositoryError::Database(format!(
                            "Unique constraint violation: {} with key {} already exists",
                            change.entity, change.key
                        )));
                    }
                    table.insert(change.key.clone(), change.record.clone());
                }
                ChangeKind::Update => {
                    if !table.contains_key(&change.key) {
                        return Err(RepositoryError::Conflict(format!(
                            "{} with key {} was not found for update",
                            change.entity, change.key
                        )));
                    }
                    table.insert(change.key.clone(), change.record.clone());
                }
                ChangeKind::Delete => {
                    if table.remove(&change.key).is_none() {
                        return Err(RepositoryError::Conflict(format!(
                            "{} with key {} was not found for delete",
                            change.entity, change.key
                        )));
                    }
                }
            }
        }

        tables.extend(working);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(kind: ChangeKind, key: i64) -> StagedChange {
        StagedChange {
            entity: "items",
            key: Value::Integer(key),
            kind,
            record: Record::new().with("id", key),
        }
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.apply(&[change(ChangeKind::Insert, 1)]).unwrap();

        let result = store.apply(&[
            change(ChangeKind::Insert, 2),
            change(ChangeKind::Insert, 1),
        ]);

        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert_eq!(store.row_count("items"), 1);
    }

    #[test]
    fn test_update_of_missing_row_conflicts() {
        let store = MemoryStore::new();
        let result = store.apply(&[change(ChangeKind::Update, 7)]);
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[test]
    fn test_view_overlays_staged_changes() {
        let store = MemoryStore::new();
        store.apply(&[change(ChangeKind::Insert, 1)]).unwrap();

        let staged = vec![change(ChangeKind::Insert, 2), change(ChangeKind::Delete, 1)];
        let view = store.view("items", &staged);

        assert_eq!(view.keys().cloned().collect::<Vec<_>>(), vec![Value::Integer(2)]);
        assert_eq!(store.row_count("items"), 1);
    }
}
