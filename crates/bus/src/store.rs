// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! SQLite-backed durable storage shared by every core component.
//!
//! A single [`rusqlite::Connection`] behind a mutex is the only writer,
//! the same single-connection shape as `loom-workspace/src/store.rs`.
//! WAL mode lets readers proceed without blocking on the writer's
//! transaction. Calls run synchronously under the mutex rather than via
//! `block_in_place` — that helper requires a multi-threaded Tokio runtime
//! and panics under both a `current_thread` runtime and no runtime at all,
//! and these queries are microsecond-scale, so the cost of holding a
//! worker thread for one is negligible.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::Error;

/// Shared handle to the bus's SQLite database.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (creating if absent) the database at `path` and runs migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::StoreError(format!("open {}: {e}", path.as_ref().display())))?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::StoreError(format!("open in-memory: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "busy_timeout", 5_000i64)?;
        let store = Self { conn: Arc::new(Mutex::new(conn)) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), Error> {
        self.with_conn(|conn| {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS threads (
                    id TEXT PRIMARY KEY,
                    topic TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    closed_at INTEGER,
                    summary TEXT,
                    metadata TEXT,
                    system_prompt TEXT
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_threads_topic ON threads(topic);

                CREATE TABLE IF NOT EXISTS seq_counter (
                    id INTEGER PRIMARY KEY CHECK (id = 0),
                    value INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS messages (
                    id TEXT PRIMARY KEY,
                    thread_id TEXT NOT NULL,
                    author TEXT NOT NULL,
                    author_id TEXT,
                    author_name TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    seq INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    metadata TEXT,
                    FOREIGN KEY (thread_id) REFERENCES threads(id)
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_thread_seq ON messages(thread_id, seq);
                CREATE INDEX IF NOT EXISTS idx_messages_thread_id ON messages(thread_id);

                CREATE TABLE IF NOT EXISTS agents (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    display_name TEXT NOT NULL,
                    alias_source TEXT NOT NULL,
                    ide TEXT NOT NULL,
                    model TEXT NOT NULL,
                    description TEXT,
                    capabilities TEXT,
                    token TEXT NOT NULL,
                    registered_at INTEGER NOT NULL,
                    last_heartbeat INTEGER NOT NULL,
                    last_activity TEXT NOT NULL,
                    last_activity_time INTEGER NOT NULL,
                    unregistered_at INTEGER
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_agents_name ON agents(name) WHERE unregistered_at IS NULL;

                CREATE TABLE IF NOT EXISTS events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_type TEXT NOT NULL,
                    thread_id TEXT,
                    payload TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at);

                INSERT OR IGNORE INTO seq_counter (id, value) VALUES (0, 0);
                "#,
            )
        })
    }

    /// Runs `f` against the shared connection under its mutex.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, Error> {
        let guard = self.conn.lock().expect("sqlite connection mutex poisoned");
        f(&guard).map_err(Error::from)
    }

    /// Runs `f` inside an immediate (write-locking) transaction, committing
    /// on `Ok` and rolling back on `Err`.
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<T>,
    ) -> Result<T, Error> {
        let mut guard = self.conn.lock().expect("sqlite connection mutex poisoned");
        let tx = guard.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
