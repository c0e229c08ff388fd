// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Thread lifecycle: create/read/list/state-transition/archive/close/delete.
//!
//! SQL-backed rows rather than an in-memory map, since threads here must
//! survive a restart.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Error;
use crate::event_log::EventLog;
use crate::model::{DeleteReceipt, Thread};
use crate::store::Store;

const VALID_STATES: &[&str] = &["discuss", "implement", "review", "done", "closed", "archived"];

pub struct ThreadRegistry {
    store: Store,
    events: Arc<EventLog>,
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    let created_at: i64 = row.get(3)?;
    let closed_at: Option<i64> = row.get(4)?;
    let metadata: Option<String> = row.get(6)?;
    Ok(Thread {
        id: row.get(0)?,
        topic: row.get(1)?,
        status: row.get(2)?,
        created_at: chrono::DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
        closed_at: closed_at.and_then(|t| chrono::DateTime::from_timestamp(t, 0)),
        summary: row.get(5)?,
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
        system_prompt: row.get(7)?,
    })
}

const THREAD_COLUMNS: &str =
    "id, topic, status, created_at, closed_at, summary, metadata, system_prompt";

impl ThreadRegistry {
    pub fn new(store: Store, events: Arc<EventLog>) -> Self {
        Self { store, events }
    }

    /// Creates a thread, or returns the existing one if `topic` raced.
    pub fn create(
        &self,
        topic: &str,
        metadata: Option<Value>,
        system_prompt: Option<String>,
    ) -> Result<Thread, Error> {
        if topic.trim().is_empty() {
            return Err(Error::InvalidInput("topic must not be empty".into()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let metadata_text = metadata.as_ref().map(|m| m.to_string());

        // Raced against another create(same topic): detect the unique-index
        // violation here (before it is erased into a generic StoreError) and
        // retry as a read.
        let inserted = self.store.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let result = tx.execute(
                "INSERT INTO threads (id, topic, status, created_at, metadata, system_prompt) \
                 VALUES (?1, ?2, 'discuss', ?3, ?4, ?5)",
                rusqlite::params![id, topic, now.timestamp(), metadata_text, system_prompt],
            );
            match result {
                Ok(_) => {
                    tx.commit()?;
                    Ok(true)
                }
                Err(e) if is_unique_violation(&e) => {
                    tx.rollback()?;
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })?;

        if inserted {
            let thread = self
                .get(&id)?
                .ok_or_else(|| Error::StoreError(format!("thread {id} vanished immediately after insert")))?;
            self.events.emit("thread.new", Some(&id), json!({"thread_id": id, "topic": topic}))?;
            Ok(thread)
        } else {
            let existing = self.store.with_conn(|conn| {
                conn.query_row(
                    &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE topic = ?1 ORDER BY created_at DESC LIMIT 1"),
                    rusqlite::params![topic],
                    row_to_thread,
                )
                .optional()
            })?;
            existing.ok_or_else(|| Error::StoreError(format!("create({topic}) raced but no existing row found")))
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<Thread>, Error> {
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1"),
                rusqlite::params![id],
                row_to_thread,
            )
            .optional()
        })
    }

    pub fn list(&self, status: Option<&str>, include_archived: bool) -> Result<Vec<Thread>, Error> {
        self.store.with_conn(|conn| {
            let sql = match status {
                Some(_) => format!(
                    "SELECT {THREAD_COLUMNS} FROM threads WHERE status = ?1 ORDER BY created_at DESC"
                ),
                None if include_archived => {
                    format!("SELECT {THREAD_COLUMNS} FROM threads ORDER BY created_at DESC")
                }
                None => format!(
                    "SELECT {THREAD_COLUMNS} FROM threads WHERE status != 'archived' ORDER BY created_at DESC"
                ),
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = match status {
                Some(s) => stmt.query_map(rusqlite::params![s], row_to_thread)?,
                None => stmt.query_map([], row_to_thread)?,
            };
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    pub fn set_state(&self, id: &str, state: &str) -> Result<bool, Error> {
        if !VALID_STATES.contains(&state) {
            return Err(Error::InvalidInput(format!("unknown thread state: {state}")));
        }
        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE threads SET status = ?1 WHERE id = ?2",
                rusqlite::params![state, id],
            )
        })?;
        if changed == 0 {
            return Ok(false);
        }
        self.events.emit("thread.state", Some(id), json!({"thread_id": id, "state": state}))?;
        if state == "archived" {
            self.events.emit("thread.archived", Some(id), json!({"thread_id": id}))?;
        }
        Ok(true)
    }

    pub fn close(&self, id: &str, summary: Option<String>) -> Result<bool, Error> {
        let now = Utc::now();
        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE threads SET status = 'closed', closed_at = ?1, summary = ?2 WHERE id = ?3",
                rusqlite::params![now.timestamp(), summary, id],
            )
        })?;
        if changed == 0 {
            return Ok(false);
        }
        self.events.emit("thread.closed", Some(id), json!({"thread_id": id}))?;
        Ok(true)
    }

    pub fn archive(&self, id: &str) -> Result<bool, Error> {
        let changed = self.store.with_conn(|conn| {
            conn.execute("UPDATE threads SET status = 'archived' WHERE id = ?1", rusqlite::params![id])
        })?;
        if changed == 0 {
            return Ok(false);
        }
        self.events.emit("thread.archived", Some(id), json!({"thread_id": id}))?;
        Ok(true)
    }

    pub fn unarchive(&self, id: &str) -> Result<bool, Error> {
        let changed = self.store.with_conn(|conn| {
            conn.execute("UPDATE threads SET status = 'discuss' WHERE id = ?1", rusqlite::params![id])
        })?;
        if changed == 0 {
            return Ok(false);
        }
        self.events.emit("thread.unarchived", Some(id), json!({"thread_id": id}))?;
        Ok(true)
    }

    /// Deletes a thread and its messages in one transaction. Emits
    /// `thread.deleted` only after the transaction commits, so subscribers
    /// never observe the event for a row they could still read.
    pub fn delete(&self, id: &str) -> Result<Option<DeleteReceipt>, Error> {
        let Some(thread) = self.get(id)? else { return Ok(None) };

        let message_count = self.store.with_tx(|tx| {
            let count: i64 =
                tx.query_row("SELECT count(*) FROM messages WHERE thread_id = ?1", rusqlite::params![id], |r| r.get(0))?;
            tx.execute("DELETE FROM messages WHERE thread_id = ?1", rusqlite::params![id])?;
            tx.execute("DELETE FROM threads WHERE id = ?1", rusqlite::params![id])?;
            Ok(count as u64)
        })?;

        let receipt = DeleteReceipt { thread_id: id.to_string(), topic: thread.topic.clone(), message_count };
        self.events.emit(
            "thread.deleted",
            Some(id),
            json!({"thread_id": id, "topic": thread.topic, "message_count": message_count}),
        )?;
        Ok(Some(receipt))
    }

    pub fn latest_seq(&self, id: &str) -> Result<i64, Error> {
        self.store.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(MAX(seq), 0) FROM messages WHERE thread_id = ?1",
                rusqlite::params![id],
                |row| row.get(0),
            )
        })
    }
}

#[cfg(test)]
#[path = "thread_registry_tests.rs"]
mod tests;
