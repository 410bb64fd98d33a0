//! In-memory adapters for integration tests.
//!
//! Compiled only with the `test-support` feature so `backend/tests/` can
//! drive the HTTP surface without PostgreSQL or a log collector.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    DiagnosticSink, DiagnosticSinkError, UserPersistenceError, UserRepository,
};
use crate::domain::{DiagnosticEvent, User, UserDraft, UserId};

#[derive(Debug, Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<UserId, User>,
}

/// `UserRepository` over a mutex-guarded map.
///
/// Ids increase monotonically like a `SERIAL` column and are never reused.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    table: Arc<Mutex<Table>>,
}

impl InMemoryUserRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Table>, UserPersistenceError> {
        self.table
            .lock()
            .map_err(|_| UserPersistenceError::connection("in-memory table lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn ensure_schema(&self) -> Result<(), UserPersistenceError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    async fn create(&self, draft: &UserDraft) -> Result<User, UserPersistenceError> {
        let mut table = self.lock()?;
        let next = table
            .last_id
            .checked_add(1)
            .ok_or_else(|| UserPersistenceError::query("id sequence exhausted"))?;
        let id = UserId::new(next).map_err(|err| UserPersistenceError::query(err.to_string()))?;
        table.last_id = next;
        let user = User::new(id, draft.clone());
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<usize, UserPersistenceError> {
        let mut table = self.lock()?;
        Ok(match table.rows.get_mut(&id) {
            Some(row) => {
                *row = User::new(id, draft.clone());
                1
            }
            None => 0,
        })
    }

    async fn delete(&self, id: UserId) -> Result<usize, UserPersistenceError> {
        Ok(usize::from(self.lock()?.rows.remove(&id).is_some()))
    }
}

/// `DiagnosticSink` remembering every delivered event.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnosticSink {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl RecordingDiagnosticSink {
    /// Snapshot of the events delivered so far, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DiagnosticSink for RecordingDiagnosticSink {
    async fn deliver(&self, event: &DiagnosticEvent) -> Result<(), DiagnosticSinkError> {
        self.events
            .lock()
            .map_err(|_| DiagnosticSinkError::transport("recording sink lock poisoned"))?
            .push(event.clone());
        Ok(())
    }
}
