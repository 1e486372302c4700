//! Session persistence behind a single capability interface.
//!
//! Two backends implement [`SessionStore`]: `SQLite` for real deployments and
//! an in-process map for tests and throwaway runs. They are never composed.

pub mod errors;
pub mod memory;
pub mod sqlite;

use std::future::Future;
use std::pin::Pin;

use crate::core::{Session, SessionId};

pub use errors::{StoreError, StoreResult};
pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// CRUD over session records keyed by id.
///
/// No locking discipline is applied: the last `upsert` for an id wins.
pub trait SessionStore: Send + Sync {
    /// List every session, most recently updated first.
    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<Session>>>;

    /// Fetch one session.
    fn get(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Option<Session>>>;

    /// Insert or replace a session. `mode` and `created_at` are kept from the first insert.
    fn upsert(&self, session: &Session) -> StoreFuture<'_, StoreResult<()>>;

    /// Delete a session. Deleting a missing id is not an error.
    fn delete(&self, id: SessionId) -> StoreFuture<'_, StoreResult<()>>;
}
