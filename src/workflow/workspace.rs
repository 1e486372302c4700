//! Session list of one mode and the current selection.
//!
//! Store failures here never block the stylist: reads degrade to an empty
//! list and writes are logged, with the in-memory copy kept authoritative.
//! Only deletion reports store errors, since nothing was removed.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::{Session, SessionId, WorkMode};
use crate::storage::SessionStore;

use super::errors::{WorkflowError, WorkflowResult};

/// Sessions of one mode, newest first, plus the one being worked on.
pub struct Workspace {
    store: Arc<dyn SessionStore>,
    mode: WorkMode,
    sessions: Vec<Session>,
    current: Option<SessionId>,
}

impl Workspace {
    /// Empty workspace for `mode`, without reading the store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, mode: WorkMode) -> Self {
        Self {
            store,
            mode,
            sessions: Vec::new(),
            current: None,
        }
    }

    /// Open the sessions of `mode`. A fresh session is created when none
    /// exist; the newest session becomes current.
    pub async fn load(store: Arc<dyn SessionStore>, mode: WorkMode) -> Self {
        let sessions = list_of_mode(store.as_ref(), mode).await;
        let mut workspace = Self {
            store,
            mode,
            current: sessions.first().map(|s| s.id),
            sessions,
        };
        if workspace.sessions.is_empty() {
            workspace.new_session(None).await;
        }
        workspace
    }

    /// Mode of every session in this workspace.
    #[must_use]
    pub const fn mode(&self) -> WorkMode {
        self.mode
    }

    /// Sessions, newest first.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Session being worked on.
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        let id = self.current?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Make `id` current.
    ///
    /// # Errors
    /// Returns [`WorkflowError::SessionNotFound`] when `id` is not in this workspace.
    pub fn select(&mut self, id: SessionId) -> WorkflowResult<&Session> {
        let session = self
            .sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or(WorkflowError::SessionNotFound(id))?;
        self.current = Some(id);
        Ok(session)
    }

    /// Start a session titled `title`, or `"<mode label> <date>"`.
    ///
    /// The session is used even when saving it fails.
    pub async fn new_session(&mut self, title: Option<String>) -> &Session {
        let session = Session::new(self.mode, title);
        if let Err(err) = self.store.upsert(&session).await {
            error!(session = %session.id, error = %err, "failed to save new session");
        }
        info!(session = %session.id, mode = self.mode.as_str(), "session created");
        self.current = Some(session.id);
        self.sessions.insert(0, session);
        &self.sessions[0]
    }

    /// Delete a session. When it was current, the next remaining session
    /// becomes current, or a fresh one is created.
    ///
    /// # Errors
    /// Returns [`WorkflowError::Store`] when the store refuses the delete;
    /// nothing is changed then.
    pub async fn delete_session(&mut self, id: SessionId) -> WorkflowResult<Option<&Session>> {
        self.store.delete(id).await?;
        self.sessions.retain(|s| s.id != id);
        info!(session = %id, "session deleted");

        if self.current == Some(id) {
            self.current = self.sessions.first().map(|s| s.id);
            if self.current.is_none() {
                self.new_session(None).await;
            }
        }
        Ok(self.current())
    }

    /// Mark the current session completed and open a fresh one.
    pub async fn proceed_to_next(&mut self) -> &Session {
        if let Some(session) = self.current_mut() {
            session.mark_completed();
            let snapshot = session.clone();
            if let Err(err) = self.store.upsert(&snapshot).await {
                error!(session = %snapshot.id, error = %err, "failed to mark session completed");
            }
        }
        self.new_session(None).await
    }

    /// Retitle the current session.
    pub async fn rename_current(&mut self, title: impl Into<String>) -> Option<&Session> {
        let title = title.into();
        let snapshot = {
            let session = self.current_mut()?;
            session.rename(title);
            session.clone()
        };
        if let Err(err) = self.store.upsert(&snapshot).await {
            error!(session = %snapshot.id, error = %err, "failed to rename session");
        }
        self.current()
    }

    fn current_mut(&mut self) -> Option<&mut Session> {
        let id = self.current?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }
}

/// Sessions of `mode`, newest first; a failed read yields an empty list.
pub async fn list_of_mode(store: &dyn SessionStore, mode: WorkMode) -> Vec<Session> {
    match store.list().await {
        Ok(sessions) => sessions.into_iter().filter(|s| s.mode == mode).collect(),
        Err(err) => {
            warn!(error = %err, "failed to list sessions");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySessionStore;

    fn store() -> Arc<InMemorySessionStore> {
        Arc::new(InMemorySessionStore::new())
    }

    #[tokio::test]
    async fn test_load_empty_creates_session() {
        let store = store();
        let ws = Workspace::load(store.clone(), WorkMode::Ohisama).await;
        assert_eq!(ws.sessions().len(), 1);
        assert_eq!(store.len(), 1);
        assert!(ws.current().unwrap().title.starts_with("Ohisama Newsletter "));
    }

    #[tokio::test]
    async fn test_load_filters_by_mode() {
        let store = store();
        store.upsert(&Session::new(WorkMode::CoopLetter, Some("cover".into()))).await.unwrap();
        store.upsert(&Session::new(WorkMode::Ohisama, Some("salmon".into()))).await.unwrap();
        let ws = Workspace::load(store.clone(), WorkMode::CoopLetter).await;
        assert_eq!(ws.sessions().len(), 1);
        assert_eq!(ws.current().unwrap().title, "cover");
    }

    #[tokio::test]
    async fn test_deleting_only_session_creates_fresh_one() {
        let store = store();
        let mut ws = Workspace::load(store.clone(), WorkMode::Ohisama).await;
        let only = ws.current().unwrap().id;

        let next = ws.delete_session(only).await.unwrap().unwrap();
        assert_ne!(next.id, only);
        assert!(!next.is_completed);
        assert_eq!(ws.sessions().len(), 1);
        assert!(store.get(only).await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_current_switches_to_remaining() {
        let mut ws = Workspace::load(store(), WorkMode::Ohisama).await;
        let older = ws.current().unwrap().id;
        let newer = ws.new_session(Some("second".into())).await.id;

        let next = ws.delete_session(newer).await.unwrap().unwrap();
        assert_eq!(next.id, older);
    }

    #[tokio::test]
    async fn test_proceed_to_next_completes_current() {
        let store = store();
        let mut ws = Workspace::load(store.clone(), WorkMode::Ohisama).await;
        let first = ws.current().unwrap().id;

        let fresh = ws.proceed_to_next().await.id;
        assert_ne!(fresh, first);
        assert!(store.get(first).await.unwrap().unwrap().is_completed);
        assert_eq!(ws.current().unwrap().id, fresh);
    }

    #[tokio::test]
    async fn test_rename_current_persists() {
        let store = store();
        let mut ws = Workspace::load(store.clone(), WorkMode::Ohisama).await;
        let id = ws.rename_current("Grilled salmon").await.unwrap().id;
        assert_eq!(store.get(id).await.unwrap().unwrap().title, "Grilled salmon");
    }

    #[tokio::test]
    async fn test_new_session_is_optimistic() {
        struct ReadOnlyStore;
        impl SessionStore for ReadOnlyStore {
            fn list(&self) -> crate::storage::StoreFuture<'_, crate::storage::StoreResult<Vec<Session>>> {
                Box::pin(async { Ok(Vec::new()) })
            }
            fn get(&self, _id: SessionId) -> crate::storage::StoreFuture<'_, crate::storage::StoreResult<Option<Session>>> {
                Box::pin(async { Ok(None) })
            }
            fn upsert(&self, _session: &Session) -> crate::storage::StoreFuture<'_, crate::storage::StoreResult<()>> {
                Box::pin(async { Err(crate::storage::StoreError::InvalidRecord("read only".into())) })
            }
            fn delete(&self, _id: SessionId) -> crate::storage::StoreFuture<'_, crate::storage::StoreResult<()>> {
                Box::pin(async { Ok(()) })
            }
        }

        let mut ws = Workspace::new(Arc::new(ReadOnlyStore), WorkMode::CoopLetter);
        let title = ws.new_session(Some("Spring cover".into())).await.title.clone();
        assert_eq!(title, "Spring cover");
        assert_eq!(ws.current().unwrap().title, "Spring cover");
    }

    #[tokio::test]
    async fn test_select_unknown_session() {
        let mut ws = Workspace::load(store(), WorkMode::Ohisama).await;
        assert!(matches!(
            ws.select(SessionId::new()),
            Err(WorkflowError::SessionNotFound(_))
        ));
    }
}
