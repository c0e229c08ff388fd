// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Append-only message storage: author resolution, seq allocation, event
//! emission, and synthetic system-prompt injection on read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::agent_registry::AgentRegistry;
use crate::error::Error;
use crate::event_log::EventLog;
use crate::model::Message;
use crate::policy::PolicyEngine;
use crate::seq::SeqAllocator;
use crate::store::Store;
use crate::system_prompt::SystemPromptComposer;

const EVENT_CONTENT_TRUNCATE: usize = 200;

pub struct MessageStore {
    store: Store,
    events: Arc<EventLog>,
    agents: Arc<AgentRegistry>,
    policy: Arc<PolicyEngine>,
    seq: Arc<SeqAllocator>,
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let created_at: i64 = row.get(8)?;
    let metadata: Option<String> = row.get(9)?;
    Ok(Message {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        author: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        role: row.get(5)?,
        content: row.get(6)?,
        seq: row.get(7)?,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
    })
}

const MESSAGE_COLUMNS: &str =
    "id, thread_id, author, author_id, author_name, role, content, seq, created_at, metadata";

impl MessageStore {
    pub fn new(
        store: Store,
        events: Arc<EventLog>,
        agents: Arc<AgentRegistry>,
        policy: Arc<PolicyEngine>,
        seq: Arc<SeqAllocator>,
    ) -> Self {
        Self { store, events, agents, policy, seq }
    }

    /// Appends a message: resolves the author, runs policy checks, allocates
    /// a seq, inserts the row, updates agent activity, and emits an event.
    pub fn append(
        &self,
        thread_id: &str,
        author: &str,
        content: &str,
        role: &str,
        metadata: Option<Value>,
    ) -> Result<Message, Error> {
        // Step 1: resolve author identity.
        let resolved_agent = self.agents.resolve(author)?;
        let (stored_author, author_id, author_name) = match &resolved_agent {
            Some(agent) => (agent.name.clone(), Some(agent.id.clone()), agent.display_name.clone()),
            None => (author.to_string(), None, author.to_string()),
        };

        // Steps 2-3: policy checks, before any seq is burned.
        let scope_key = author_id.clone().unwrap_or_else(|| author.to_string());
        self.policy.rate_check("author", &scope_key)?;
        self.policy.content_check(content)?;

        // Step 4: allocate the seq first, in its own committed transaction —
        // a subsequent insert failure burns this seq rather than rolling
        // back the allocation.
        let seq = self.seq.next()?;

        // Step 5: insert the message row with the allocated seq.
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let metadata_text = metadata.as_ref().map(|m| m.to_string());
        let thread_id_owned = thread_id.to_string();

        self.store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO messages (id, thread_id, author, author_id, author_name, role, content, seq, created_at, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![id, thread_id_owned, stored_author, author_id, author_name, role, content, seq, now.timestamp(), metadata_text],
            )?;
            Ok(())
        })?;

        // Step 6: update agent activity.
        if let Some(agent) = &resolved_agent {
            self.agents.mark_msg_post(&agent.id)?;
        }

        // Step 7: emit truncated-payload event (storage keeps full content).
        let truncated: String = content.chars().take(EVENT_CONTENT_TRUNCATE).collect();
        self.events.emit(
            "msg.new",
            Some(thread_id),
            json!({
                "msg_id": id, "thread_id": thread_id, "author": stored_author,
                "author_id": author_id, "role": role, "seq": seq, "content": truncated,
            }),
        )?;

        Ok(Message {
            id,
            thread_id: thread_id.to_string(),
            author: stored_author,
            author_id,
            author_name,
            role: role.to_string(),
            content: content.to_string(),
            seq,
            created_at: now,
            metadata,
        })
    }

    /// Returns messages with `seq > after_seq`, ascending, bounded by
    /// `limit`, with the synthetic system-prompt row prepended when
    /// `include_system_prompt && after_seq == 0`.
    pub fn list(
        &self,
        thread_id: &str,
        after_seq: i64,
        limit: u32,
        include_system_prompt: bool,
        thread_system_prompt: Option<&str>,
    ) -> Result<Vec<Message>, Error> {
        let mut rows = self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE thread_id = ?1 AND seq > ?2 ORDER BY seq ASC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(rusqlite::params![thread_id, after_seq, limit], row_to_message)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        if include_system_prompt && after_seq == 0 {
            let synthetic = SystemPromptComposer::compose(thread_system_prompt);
            let prompt_message = Message {
                id: "system-prompt".to_string(),
                thread_id: thread_id.to_string(),
                author: "system".to_string(),
                author_id: None,
                author_name: "System".to_string(),
                role: "system".to_string(),
                content: synthetic,
                seq: 0,
                created_at: Utc::now(),
                metadata: None,
            };
            rows.insert(0, prompt_message);
        }

        Ok(rows)
    }
}

#[cfg(test)]
#[path = "message_store_tests.rs"]
mod tests;
