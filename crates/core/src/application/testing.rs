// Journal-backed unit of work for application layer tests

use crate::domain::{Entity, Query, Record};
use crate::error::Result;
use crate::port::{Capabilities, QueryExecutor, Transaction, UnitOfWork};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Note {
    pub id: i64,
    pub body: String,
}

impl Entity for Note {
    type Key = i64;
    const NAME: &'static str = "notes";
    const KEY_FIELD: &'static str = "id";
    const FIELDS: &'static [&'static str] = &["id", "body"];

    fn key(&self) -> i64 {
        self.id
    }

    fn to_record(&self) -> Result<Record> {
        Ok(Record::new().with("id", self.id).with("body", self.body.as_str()))
    }

    fn from_record(record: Record) -> Result<Self> {
        Ok(Note {
            id: record.integer("id")?,
            body: record.text("body")?,
        })
    }
}

/// Records every call so tests can assert the exact sequence
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    fn push(&self, entry: &'static str) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

pub(crate) struct JournalTransaction {
    journal: Journal,
}

#[async_trait]
impl Transaction for JournalTransaction {
    async fn commit(self) -> Result<()> {
        self.journal.push("commit");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.journal.push("rollback");
        Ok(())
    }
}

/// Unit of work whose store is a fixed list of notes
pub(crate) struct JournalUnitOfWork {
    pub journal: Journal,
    pub notes: Vec<Note>,
}

impl JournalUnitOfWork {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            journal: Journal::default(),
            notes,
        }
    }
}

struct FixedRows<T>(Vec<T>);

#[async_trait]
impl<T: Entity> QueryExecutor<T> for FixedRows<T> {
    async fn execute(&self, query: &Query<T>) -> Result<Vec<T>> {
        Ok(query.evaluate(self.0.clone()))
    }
}

fn rows_of<T: Entity>(notes: &[Note]) -> Result<Vec<T>> {
    notes
        .iter()
        .map(|note| note.to_record().and_then(T::from_record))
        .collect()
}

#[async_trait]
impl UnitOfWork for JournalUnitOfWork {
    type Transaction = JournalTransaction;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    async fn insert<T: Entity>(&self, _entity: &T) -> Result<()> {
        self.journal.push("insert");
        Ok(())
    }

    async fn update<T: Entity>(&self, _entity: &T) -> Result<()> {
        self.journal.push("update");
        Ok(())
    }

    async fn delete<T: Entity>(&self, _entity: &T) -> Result<()> {
        self.journal.push("delete");
        Ok(())
    }

    async fn get_all<T: Entity>(&self) -> Result<Vec<T>> {
        self.journal.push("get_all");
        rows_of(&self.notes)
    }

    async fn flush(&self) -> Result<()> {
        self.journal.push("flush");
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<JournalTransaction> {
        self.journal.push("begin");
        Ok(JournalTransaction {
            journal: self.journal.clone(),
        })
    }

    fn queryable<T: Entity>(&self) -> Arc<dyn QueryExecutor<T>> {
        Arc::new(FixedRows(rows_of::<T>(&self.notes).unwrap_or_default()))
    }

    async fn close(self) -> Result<()> {
        self.journal.push("close");
        Ok(())
    }
}
