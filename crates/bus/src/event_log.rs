// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Durable, prunable append-only log of change notifications, with a live
//! broadcast fan-out for streaming subscribers.
//!
//! Backed by an indexed SQL table: `since` is a plain range query and
//! `prune` a bounded `DELETE`, with a monotonic id for catch-up reads.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Error;
use crate::model::Event;
use crate::store::Store;

/// Capacity of the live fan-out channel. A slow subscriber that falls this
/// far behind misses events and must resynchronize via [`EventLog::since`].
const BROADCAST_CAPACITY: usize = 1024;

/// Append-only, prunable log of [`Event`] rows, with a broadcast channel for
/// subscribers that want to be notified as new events are committed.
pub struct EventLog {
    store: Store,
    tx: broadcast::Sender<Event>,
}

impl EventLog {
    pub fn new(store: Store) -> Self {
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self { store, tx }
    }

    /// Subscribe to events emitted after this call returns. Callers that also
    /// need history should call [`EventLog::since`] first and then subscribe,
    /// accepting the small window of possible duplicate delivery (consumers
    /// dedupe by event id).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Inserts one event row, commits, and notifies live subscribers.
    pub fn emit(
        &self,
        event_type: &str,
        thread_id: Option<&str>,
        payload: Value,
    ) -> Result<Event, Error> {
        let event_type = event_type.to_string();
        let thread_id_owned = thread_id.map(|s| s.to_string());
        let payload_text = payload.to_string();
        let now = Utc::now();

        let event = self.store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO events (event_type, thread_id, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![event_type, thread_id_owned, payload_text, now.timestamp()],
            )?;
            let id = tx.last_insert_rowid();
            Ok(Event { id, event_type: event_type.clone(), thread_id: thread_id_owned.clone(), payload: payload.clone(), created_at: now })
        })?;

        // A subscriber-less channel returns Err(SendError); that's expected
        // whenever no WS/MCP client is currently connected.
        let _ = self.tx.send(event.clone());
        Ok(event)
    }

    /// Returns events with `id > after_id`, ascending, bounded by `limit`.
    pub fn since(&self, after_id: i64, limit: u32) -> Result<Vec<Event>, Error> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_type, thread_id, payload, created_at FROM events \
                 WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
            )?;
            let rows = stmt.query_map(rusqlite::params![after_id, limit], row_to_event)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    /// Deletes events older than `max_age`. Safe to run concurrently with
    /// `since` readers — SQLite's WAL isolates the delete from in-flight
    /// SELECTs.
    pub fn prune(&self, max_age: Duration) -> Result<u64, Error> {
        let cutoff = (Utc::now() - max_age).timestamp();
        self.store.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM events WHERE created_at < ?1", rusqlite::params![cutoff])?;
            Ok(deleted as u64)
        })
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let payload_text: String = row.get(3)?;
    let payload: Value = serde_json::from_str(&payload_text).unwrap_or(Value::Null);
    let created_at: i64 = row.get(4)?;
    Ok(Event {
        id: row.get(0)?,
        event_type: row.get(1)?,
        thread_id: row.get(2)?,
        payload,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
