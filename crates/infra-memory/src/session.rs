// Memory session - staged changes and transaction scopes of one unit of work

use crate::options::MemoryOptions;
use crate::store::{ChangeKind, MemoryStore, StagedChange};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use unitas_core::domain::{Entity, Value};
use unitas_core::error::{RepositoryError, Result};

#[derive(Debug, Clone, Copy)]
struct Scope {
    id: u64,
    mark: usize,
}

#[derive(Default)]
struct SessionState {
    staged: Vec<StagedChange>,
    scopes: Vec<Scope>,
    next_scope: u64,
    closed: bool,
}

/// Session shared by a unit of work, its transactions and its executors
pub(crate) struct MemorySession {
    id: u64,
    store: Arc<MemoryStore>,
    options: MemoryOptions,
    state: Mutex<SessionState>,
}

impl MemorySession {
    pub fn new(id: u64, store: Arc<MemoryStore>, options: MemoryOptions) -> Self {
        Self {
            id,
            store,
            options,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> MemoryOptions {
        self.options
    }

    pub fn staged_count(&self) -> usize {
        self.state.lock().staged.len()
    }

    pub fn stage<T: Entity>(&self, entity: &T, kind: ChangeKind) -> Result<()> {
        let record = entity.to_record()?;
        let mut state = self.state.lock();
        ensure_open(&state)?;

        state.staged.push(StagedChange {
            entity: T::NAME,
            key: entity.key_value(),
            kind,
            record,
        });
        debug!(
            session = self.id,
            entity = T::NAME,
            kind = ?kind,
            staged = state.staged.len(),
            "Staged change"
        );
        Ok(())
    }

    /// Every visible row of `T`, in key order
    pub fn rows<T: Entity>(&self) -> Result<Vec<T>> {
        let table = {
            let state = self.state.lock();
            ensure_open(&state)?;
            self.store.view(T::NAME, &state.staged)
        };

        table.into_values().map(T::from_record).collect()
    }

    pub fn find<T: Entity>(&self, key: &Value) -> Result<Option<T>> {
        let record = {
            let state = self.state.lock();
            ensure_open(&state)?;
            self.store.view(T::NAME, &state.staged).remove(key)
        };

        record.map(T::from_record).transpose()
    }

    /// Applies staged changes to the store
    ///
    /// Inside an open scope the flush is enlisted and runs at the outermost
    /// commit. A failed flush keeps the staged changes.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        ensure_open(&state)?;

        if !state.scopes.is_empty() {
            debug!(
                session = self.id,
                scopes = state.scopes.len(),
                "Flush deferred to outermost commit"
            );
            return Ok(());
        }
        self.apply(&mut state)
    }

    pub fn begin_scope(&self) -> Result<u64> {
        let mut state = self.state.lock();
        ensure_open(&state)?;

        state.next_scope += 1;
        let scope = Scope {
            id: state.next_scope,
            mark: state.staged.len(),
        };
        state.scopes.push(scope);
        debug!(
            session = self.id,
            scope = scope.id,
            depth = state.scopes.len(),
            "Transaction started"
        );
        Ok(scope.id)
    }

    /// Commits a scope and every scope nested inside it
    pub fn commit_scope(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock();
        ensure_open(&state)?;
        let (position, scope) = find_scope(&state, id)?;

        state.scopes.truncate(position);
        if !state.scopes.is_empty() {
            debug!(session = self.id, scope = id, "Nested transaction committed");
            return Ok(());
        }

        if let Err(err) = self.apply(&mut state) {
            state.staged.truncate(scope.mark);
            warn!(
                session = self.id,
                scope = id,
                error = %err,
                "Commit failed, transaction rolled back"
            );
            return Err(err);
        }
        info!(session = self.id, scope = id, "Transaction committed");
        Ok(())
    }

    /// Discards changes staged since the scope began; unknown scopes are
    /// ignored since an outer rollback already covered them
    pub fn rollback_scope(&self, id: u64) {
        let mut state = self.state.lock();
        let Some(position) = state.scopes.iter().position(|s| s.id == id) else {
            return;
        };

        let mark = state.scopes[position].mark;
        state.staged.truncate(mark);
        state.scopes.truncate(position);
        debug!(
            session = self.id,
            scope = id,
            staged = state.staged.len(),
            "Transaction rolled back"
        );
    }

    pub fn is_open_scope(&self, id: u64) -> bool {
        self.state.lock().scopes.iter().any(|s| s.id == id)
    }

    /// Releases the session; later operations fail with `InvalidState`
    pub fn dispose(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }

        let result = if self.options.flushes_on_dispose && state.scopes.is_empty() {
            self.apply(&mut state)
        } else {
            Ok(())
        };

        if !state.staged.is_empty() {
            warn!(
                session = self.id,
                discarded = state.staged.len(),
                "Unit of work closed with unflushed changes"
            );
        }
        state.staged.clear();
        state.scopes.clear();
        state.closed = true;
        debug!(session = self.id, "Unit of work closed");
        result
    }

    fn apply(&self, state: &mut SessionState) -> Result<()> {
        if state.staged.is_empty() {
            return Ok(());
        }

        self.store.apply(&state.staged)?;
        info!(session = self.id, applied = state.staged.len(), "Flushed staged changes");
        state.staged.clear();
        Ok(())
    }
}

fn ensure_open(state: &SessionState) -> Result<()> {
    if state.closed {
        return Err(RepositoryError::InvalidState(
            "unit of work is closed".to_string(),
        ));
    }
    Ok(())
}

fn find_scope(state: &SessionState, id: u64) -> Result<(usize, Scope)> {
    state
        .scopes
        .iter()
        .enumerate()
        .find(|(_, s)| s.id == id)
        .map(|(position, scope)| (position, *scope))
        .ok_or_else(|| {
            RepositoryError::InvalidState(format!(
                "transaction {id} is no longer active (an enclosing scope already ended)"
            ))
        })
}
