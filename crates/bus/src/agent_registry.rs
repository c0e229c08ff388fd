// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Agent registration, heartbeat-derived presence, and activity tracking.
//!
//! Liveness is derived, not stored: health comes from comparing
//! `last_heartbeat` against a timeout rather than an explicit online flag.
//! Capability tokens are generated with `rand::rng().fill` and encoded as
//! URL-safe, unpadded base64.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Error;
use crate::event_log::EventLog;
use crate::model::Agent;
use crate::store::Store;

const TOKEN_BYTES: usize = 32;

fn generate_token() -> String {
    use rand::Rng;
    let mut buf = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

pub struct AgentRegistry {
    store: Store,
    events: std::sync::Arc<EventLog>,
    heartbeat_timeout: Duration,
}

fn row_to_agent(row: &rusqlite::Row<'_>, now: DateTime<Utc>, heartbeat_timeout: Duration) -> rusqlite::Result<Agent> {
    let registered_at: i64 = row.get(9)?;
    let last_heartbeat: i64 = row.get(10)?;
    let last_activity_time: i64 = row.get(12)?;
    let last_heartbeat_dt = DateTime::from_timestamp(last_heartbeat, 0).unwrap_or(now);
    let capabilities: Option<String> = row.get(8)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        alias_source: row.get(3)?,
        ide: row.get(4)?,
        model: row.get(5)?,
        description: row.get(6)?,
        capabilities: capabilities.and_then(|c| serde_json::from_str(&c).ok()),
        registered_at: DateTime::from_timestamp(registered_at, 0).unwrap_or(now),
        last_heartbeat: last_heartbeat_dt,
        last_activity: row.get(11)?,
        last_activity_time: DateTime::from_timestamp(last_activity_time, 0).unwrap_or(now),
        token: row.get(7)?,
        is_online: now - last_heartbeat_dt < heartbeat_timeout,
    })
}

const AGENT_COLUMNS: &str = "id, name, display_name, alias_source, ide, model, description, token, \
     capabilities, registered_at, last_heartbeat, last_activity, last_activity_time";

impl AgentRegistry {
    pub fn new(store: Store, events: std::sync::Arc<EventLog>, heartbeat_timeout: Duration) -> Self {
        Self { store, events, heartbeat_timeout }
    }

    /// Registers a new agent, disambiguating `name` among currently live
    /// agents (rows whose `unregistered_at` is still null — unregister is a
    /// presence signal, not a deletion, so a reused base name must still
    /// skip names already taken by a soft-unregistered agent).
    pub fn register(
        &self,
        ide: &str,
        model: &str,
        description: Option<String>,
        capabilities: Option<Value>,
        display_name: Option<String>,
    ) -> Result<Agent, Error> {
        let base_name = format!("{ide} ({model})");
        let now = Utc::now();

        let id = self.store.with_tx(|tx| {
            let name = disambiguate_name(tx, &base_name)?;
            let id = Uuid::new_v4().to_string();
            let token = generate_token();
            let (resolved_display_name, alias_source) = match display_name {
                Some(ref d) if !d.trim().is_empty() => (d.clone(), "user"),
                _ => (format!("{ide} agent ({})", &id[id.len().saturating_sub(4)..]), "auto"),
            };
            let capabilities_text = capabilities.as_ref().map(|c| c.to_string());
            tx.execute(
                "INSERT INTO agents (id, name, display_name, alias_source, ide, model, description, \
                 capabilities, token, registered_at, last_heartbeat, last_activity, last_activity_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, 'registered', ?10)",
                rusqlite::params![
                    id, name, resolved_display_name, alias_source, ide, model, description,
                    capabilities_text, token, now.timestamp(),
                ],
            )?;
            Ok(id)
        })?;

        let agent = self
            .get(&id)?
            .ok_or_else(|| Error::StoreError(format!("agent {id} vanished immediately after insert")))?;
        self.events.emit("agent.online", None, json!({"agent_id": id, "name": agent.name}))?;
        Ok(agent)
    }

    pub fn get(&self, id: &str) -> Result<Option<Agent>, Error> {
        let now = Utc::now();
        let heartbeat_timeout = self.heartbeat_timeout;
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
                rusqlite::params![id],
                |row| row_to_agent(row, now, heartbeat_timeout),
            )
            .optional()
        })
    }

    fn validate_token(&self, id: &str, token: &str) -> Result<(), Error> {
        let stored: Option<String> = self
            .store
            .with_conn(|conn| conn.query_row("SELECT token FROM agents WHERE id = ?1", rusqlite::params![id], |r| r.get(0)).optional())?;
        match stored {
            Some(t) if constant_time_eq(&t, token) => Ok(()),
            _ => Err(Error::AuthFailed),
        }
    }

    pub fn heartbeat(&self, id: &str, token: &str) -> Result<bool, Error> {
        if self.validate_token(id, token).is_err() {
            return Ok(false);
        }
        let now = Utc::now();
        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE agents SET last_heartbeat = ?1, last_activity = 'heartbeat', last_activity_time = ?1 WHERE id = ?2",
                rusqlite::params![now.timestamp(), id],
            )
        })?;
        Ok(changed > 0)
    }

    pub fn resume(&self, id: &str, token: &str) -> Result<Agent, Error> {
        self.validate_token(id, token)?;
        let now = Utc::now();
        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE agents SET last_heartbeat = ?1, last_activity = 'resume', last_activity_time = ?1 WHERE id = ?2",
                rusqlite::params![now.timestamp(), id],
            )
        })?;
        if changed == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        let agent = self
            .get(id)?
            .ok_or_else(|| Error::StoreError(format!("agent {id} vanished immediately after update")))?;
        self.events.emit("agent.online", None, json!({"agent_id": id, "name": agent.name}))?;
        self.events.emit("agent.resume", None, json!({"agent_id": id}))?;
        Ok(agent)
    }

    pub fn unregister(&self, id: &str, token: &str) -> Result<bool, Error> {
        if self.validate_token(id, token).is_err() {
            return Ok(false);
        }
        let now = Utc::now();
        self.store.with_conn(|conn| {
            conn.execute("UPDATE agents SET unregistered_at = ?1 WHERE id = ?2", rusqlite::params![now.timestamp(), id])
        })?;
        self.events.emit("agent.offline", None, json!({"agent_id": id}))?;
        Ok(true)
    }

    pub fn list(&self) -> Result<Vec<Agent>, Error> {
        let now = Utc::now();
        let heartbeat_timeout = self.heartbeat_timeout;
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY registered_at ASC"))?;
            let rows = stmt.query_map([], |row| row_to_agent(row, now, heartbeat_timeout))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    pub fn mark_msg_wait(&self, id: &str, token: &str) -> Result<bool, Error> {
        if self.validate_token(id, token).is_err() {
            return Ok(false);
        }
        let now = Utc::now();
        let changed = self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE agents SET last_activity = 'msg_wait', last_activity_time = ?1 WHERE id = ?2",
                rusqlite::params![now.timestamp(), id],
            )
        })?;
        Ok(changed > 0)
    }

    pub fn mark_msg_post(&self, id: &str) -> Result<(), Error> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            conn.execute(
                "UPDATE agents SET last_activity = 'msg_post', last_activity_time = ?1 WHERE id = ?2",
                rusqlite::params![now.timestamp(), id],
            )
        })?;
        Ok(())
    }

    /// Resolves `author` to a registered agent, if it names one by id.
    pub fn resolve(&self, author: &str) -> Result<Option<Agent>, Error> {
        self.get(author)
    }

    /// Emits `agent.typing` without touching activity/heartbeat state:
    /// a UI signal, not presence.
    pub fn set_typing(&self, id: &str, token: &str, thread_id: &str) -> Result<bool, Error> {
        if self.validate_token(id, token).is_err() {
            return Ok(false);
        }
        self.events.emit("agent.typing", Some(thread_id), json!({"agent_id": id, "thread_id": thread_id}))?;
        Ok(true)
    }
}

fn disambiguate_name(tx: &rusqlite::Transaction<'_>, base_name: &str) -> rusqlite::Result<String> {
    let exists = |name: &str| -> rusqlite::Result<bool> {
        let count: i64 = tx.query_row(
            "SELECT count(*) FROM agents WHERE name = ?1 AND unregistered_at IS NULL",
            rusqlite::params![name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    };
    if !exists(base_name)? {
        return Ok(base_name.to_string());
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base_name} {n}");
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

#[cfg(test)]
#[path = "agent_registry_tests.rs"]
mod tests;
