//! `SQLite`-backed session store.
//!
//! Messages and products live in JSON text columns next to the scalar
//! fields, one row per session.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::core::{Message, Product, Session, SessionId, WorkMode};

use super::errors::{StoreError, StoreResult};
use super::{SessionStore, StoreFuture};

/// Raw column values for one session row.
struct SessionRow {
    id: SessionId,
    title: String,
    mode: String,
    theme: Option<String>,
    products: String,
    messages: String,
    is_completed: bool,
    created_at: i64,
    updated_at: i64,
}

impl SessionRow {
    const COLUMNS: &'static str =
        "id, title, mode, theme, products, messages, is_completed, created_at, updated_at";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            mode: row.get(2)?,
            theme: row.get(3)?,
            products: row.get(4)?,
            messages: row.get(5)?,
            is_completed: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_session(self) -> StoreResult<Session> {
        let mode = self
            .mode
            .parse::<WorkMode>()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        let products: Vec<Product> = serde_json::from_str(&self.products)?;
        let messages: Vec<Message> = serde_json::from_str(&self.messages)?;
        Ok(Session {
            id: self.id,
            title: self.title,
            mode,
            theme: self.theme,
            messages,
            products,
            is_completed: self.is_completed,
            created_at: millis_to_datetime(self.created_at, "created_at")?,
            updated_at: millis_to_datetime(self.updated_at, "updated_at")?,
        })
    }
}

fn millis_to_datetime(ms: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::InvalidRecord(format!("invalid {column} timestamp")))
}

/// `SQLite` implementation of [`SessionStore`].
pub struct SqliteSessionStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteSessionStore {
    /// Table name for sessions.
    pub const DEFAULT_TABLE: &'static str = "app_sessions";

    /// Open (or create) the database file and ensure the table exists.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path).await?;
        Self::new(Arc::new(conn)).await
    }

    /// Initialize the store on an existing connection and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>) -> StoreResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    mode TEXT NOT NULL,
                    theme TEXT,
                    products TEXT NOT NULL DEFAULT '[]',
                    messages TEXT NOT NULL DEFAULT '[]',
                    is_completed INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_updated
                    ON {table_name} (updated_at DESC);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl SessionStore for SqliteSessionStore {
    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<Session>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM {table} ORDER BY updated_at DESC",
                        SessionRow::COLUMNS
                    ))?;
                    let rows = stmt
                        .query_map([], SessionRow::from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;
            rows.into_iter().map(SessionRow::into_session).collect()
        })
    }

    fn get(&self, id: SessionId) -> StoreFuture<'_, StoreResult<Option<Session>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let row = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            &format!("SELECT {} FROM {table} WHERE id = ?1", SessionRow::COLUMNS),
                            rusqlite::params![id],
                            SessionRow::from_row,
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;
            row.map(SessionRow::into_session).transpose()
        })
    }

    fn upsert(&self, session: &Session) -> StoreFuture<'_, StoreResult<()>> {
        let session = session.clone();
        Box::pin(async move {
            let table = self.table.clone();
            let products = serde_json::to_string(&session.products)?;
            let messages = serde_json::to_string(&session.messages)?;
            let created_at = session.created_at.timestamp_millis();
            let updated_at = session.updated_at.timestamp_millis();

            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} ({})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                             ON CONFLICT(id) DO UPDATE SET
                                title = excluded.title,
                                theme = excluded.theme,
                                products = excluded.products,
                                messages = excluded.messages,
                                is_completed = excluded.is_completed,
                                updated_at = excluded.updated_at",
                            SessionRow::COLUMNS
                        ),
                        rusqlite::params![
                            session.id,
                            session.title,
                            session.mode.as_str(),
                            session.theme,
                            products,
                            messages,
                            session.is_completed,
                            created_at,
                            updated_at
                        ],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn delete(&self, id: SessionId) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!("DELETE FROM {table} WHERE id = ?1"),
                        rusqlite::params![id],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}
