//! Process-wide map of download sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::RegistryError;
use crate::progress::ProgressRecord;
use crate::session_id::SessionIdGenerator;

/// Registry of every session accepted since the process started.
///
/// The map lock is held only for insert/lookup. Callers get an
/// `Arc<ProgressRecord>` back and read/write through the record's own lock,
/// so steady-state polling never touches the map lock.
pub struct SessionRegistry {
    ids: SessionIdGenerator,
    sessions: RwLock<HashMap<String, Arc<ProgressRecord>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            ids: SessionIdGenerator::new(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a zero-state record under `id`.
    pub fn create(&self, id: impl Into<String>) -> Result<Arc<ProgressRecord>, RegistryError> {
        let id = id.into();
        let mut sessions = self.write();
        if sessions.contains_key(&id) {
            return Err(RegistryError::Duplicate { id });
        }
        let record = Arc::new(ProgressRecord::new(id.clone()));
        sessions.insert(id, Arc::clone(&record));
        Ok(record)
    }

    /// Generate a fresh time-based id and insert a record under it.
    pub fn create_session(&self) -> Arc<ProgressRecord> {
        loop {
            match self.create(self.ids.next_id()) {
                Ok(record) => return record,
                // Only reachable if someone inserted a hand-picked id that
                // matches the next generated one; the generator moves past it.
                Err(RegistryError::Duplicate { id }) => {
                    tracing::warn!(download_id = %id, "Generated session id already taken");
                }
            }
        }
    }

    /// The same record instance the worker mutates, if the id is known.
    pub fn get(&self, id: &str) -> Option<Arc<ProgressRecord>> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop finished sessions whose terminal status is older than `ttl`.
    /// Returns how many were removed. Running sessions are never touched.
    pub fn evict_finished(&self, ttl: Duration) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, record| match record.finished_at() {
            Some(at) => at.elapsed() < ttl,
            None => true,
        });
        before - sessions.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ProgressRecord>>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            tracing::error!("Session registry lock poisoned (read)");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ProgressRecord>>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            tracing::error!("Session registry lock poisoned (write)");
            poisoned.into_inner()
        })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
