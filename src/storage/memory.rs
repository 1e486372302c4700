//! In-process session store.

use dashmap::DashMap;

use crate::core::{Session, SessionId};

use super::errors::StoreResult;
use super::{SessionStore, StoreFuture};

/// Session store backed by a concurrent map. Contents vanish with the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Session>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<Session>>> {
        Box::pin(async move {
            let mut sessions: Vec<Session> =
                self.sessions.iter().map(|entry| entry.value().clone()).collect();
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        })
    }

    fn get(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Option<Session>>> {
        Box::pin(async move { Ok(self.sessions.get(&id).map(|entry| entry.value().clone())) })
    }

    fn upsert(&self, session: &Session) -> StoreFuture<'_, StoreResult<()>> {
        let mut session = session.clone();
        Box::pin(async move {
            if let Some(existing) = self.sessions.get(&session.id) {
                session.mode = existing.mode;
                session.created_at = existing.created_at;
            }
            self.sessions.insert(session.id, session);
            Ok(())
        })
    }

    fn delete(&self, id: SessionId) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.sessions.remove(&id);
            Ok(())
        })
    }
}
