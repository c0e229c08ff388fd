// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Shared data types for threads, messages, agents, and events.
//!
//! These are plain serializable structs used across the Store, the core
//! components, and every transport — the same role `src/db/models.py`
//! plays in the implementation this bus was distilled from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Discuss,
    Implement,
    Review,
    Done,
    Closed,
    Archived,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discuss => "discuss",
            Self::Implement => "implement",
            Self::Review => "review",
            Self::Done => "done",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "discuss" => Some(Self::Discuss),
            "implement" => Some(Self::Implement),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            "closed" => Some(Self::Closed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// A topic-scoped conversation container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub topic: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    /// Opaque JSON object, stored verbatim.
    pub metadata: Option<serde_json::Value>,
    pub system_prompt: Option<String>,
}

/// Result of a successful [`crate::thread_registry::ThreadRegistry::delete`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub thread_id: String,
    pub topic: String,
    pub message_count: u64,
}

/// The role a [`Message`] was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// An ordered entry in a thread's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    /// Resolved at write time: the agent's machine name, or the caller's
    /// raw string for non-agent senders.
    pub author: String,
    pub author_id: Option<String>,
    pub author_name: String,
    pub role: String,
    pub content: String,
    /// 0 only for the synthetic system-prompt row; never stored as 0.
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// How a [`Agent`] most recently proved it is alive/active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Registered,
    Heartbeat,
    Resume,
    MsgWait,
    MsgPost,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Heartbeat => "heartbeat",
            Self::Resume => "resume",
            Self::MsgWait => "msg_wait",
            Self::MsgPost => "msg_post",
        }
    }
}

/// Where an agent's `display_name` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasSource {
    Auto,
    User,
}

impl AliasSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::User => "user",
        }
    }
}

/// A client identity registered on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    /// Machine name, deterministically disambiguated at registration.
    pub name: String,
    pub display_name: String,
    pub alias_source: String,
    pub ide: String,
    pub model: String,
    pub description: Option<String>,
    pub capabilities: Option<serde_json::Value>,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub last_activity: String,
    pub last_activity_time: DateTime<Utc>,
    /// Omitted whenever an `Agent` crosses a transport boundary to a
    /// non-owning caller (see `agent.list`'s contract).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub is_online: bool,
}

/// A durable, transient change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub thread_id: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
