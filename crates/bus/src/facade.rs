// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! One function per bus operation. Owns argument validation, the
//! per-request timeout envelope, and error translation, so every transport
//! (HTTP, WS, MCP) calls the same business logic.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::agent_registry::AgentRegistry;
use crate::error::Error;
use crate::event_log::EventLog;
use crate::message_store::MessageStore;
use crate::model::{Agent, DeleteReceipt, Message, Thread};
use crate::policy::PolicyEngine;
use crate::thread_registry::ThreadRegistry;
use crate::wait::WaitCoordinator;

/// Default per-request timeout for Store operations.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Facade {
    pub threads: Arc<ThreadRegistry>,
    pub messages: Arc<MessageStore>,
    pub agents: Arc<AgentRegistry>,
    pub policy: Arc<PolicyEngine>,
    pub events: Arc<EventLog>,
    pub wait: Arc<WaitCoordinator>,
}

/// Wraps a synchronous Store-backed call with the operation's timeout
/// envelope. `wait` has its own caller-supplied timeout and does not use
/// this wrapper (see [`Facade::msg_wait`]).
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T, Error>>) -> Result<T, Error> {
    match tokio::time::timeout(DEFAULT_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout),
    }
}

impl Facade {
    pub fn thread_create(&self, topic: &str, metadata: Option<Value>, system_prompt: Option<String>) -> Result<Thread, Error> {
        self.threads.create(topic, metadata, system_prompt)
    }

    pub fn thread_get(&self, id: &str) -> Result<Option<Thread>, Error> {
        self.threads.get(id)
    }

    pub fn thread_list(&self, status: Option<&str>, include_archived: bool) -> Result<Vec<Thread>, Error> {
        self.threads.list(status, include_archived)
    }

    pub fn thread_set_state(&self, id: &str, state: &str) -> Result<bool, Error> {
        self.threads.set_state(id, state)
    }

    pub fn thread_close(&self, id: &str, summary: Option<String>) -> Result<bool, Error> {
        self.threads.close(id, summary)
    }

    pub fn thread_archive(&self, id: &str) -> Result<bool, Error> {
        self.threads.archive(id)
    }

    pub fn thread_unarchive(&self, id: &str) -> Result<bool, Error> {
        self.threads.unarchive(id)
    }

    /// Deletion must be explicitly confirmed; HTTP callers set it via the
    /// DELETE verb itself (no body flag needed), MCP callers must pass
    /// `confirm: true`.
    pub fn thread_delete(&self, id: &str, confirm: bool) -> Result<Option<DeleteReceipt>, Error> {
        if !confirm {
            return Err(Error::InvalidInput("delete requires confirm=true".into()));
        }
        self.threads.delete(id)
    }

    pub fn msg_post(
        &self,
        thread_id: &str,
        author: &str,
        content: &str,
        role: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<Message, Error> {
        let role = role.unwrap_or("user");
        if !["user", "assistant", "system"].contains(&role) {
            return Err(Error::InvalidInput(format!("unknown role: {role}")));
        }
        if self.threads.get(thread_id)?.is_none() {
            return Err(Error::NotFound(thread_id.to_string()));
        }
        self.messages.append(thread_id, author, content, role, metadata)
    }

    pub fn msg_list(
        &self,
        thread_id: &str,
        after_seq: i64,
        limit: u32,
        include_system_prompt: bool,
    ) -> Result<Vec<Message>, Error> {
        let thread = self.threads.get(thread_id)?.ok_or_else(|| Error::NotFound(thread_id.to_string()))?;
        self.messages.list(thread_id, after_seq, limit, include_system_prompt, thread.system_prompt.as_deref())
    }

    pub async fn msg_wait(
        &self,
        thread_id: &str,
        after_seq: i64,
        timeout_ms: u64,
        agent_id: Option<&str>,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, Error> {
        self.wait.wait(thread_id, after_seq, timeout_ms, agent_id, token, cancel).await
    }

    pub fn agent_register(
        &self,
        ide: &str,
        model: &str,
        description: Option<String>,
        capabilities: Option<Value>,
        display_name: Option<String>,
    ) -> Result<Agent, Error> {
        if ide.trim().is_empty() || model.trim().is_empty() {
            return Err(Error::InvalidInput("ide and model must not be empty".into()));
        }
        self.agents.register(ide, model, description, capabilities, display_name)
    }

    pub fn agent_heartbeat(&self, id: &str, token: &str) -> Result<bool, Error> {
        self.agents.heartbeat(id, token)
    }

    pub fn agent_resume(&self, id: &str, token: &str) -> Result<Agent, Error> {
        self.agents.resume(id, token)
    }

    pub fn agent_unregister(&self, id: &str, token: &str) -> Result<bool, Error> {
        self.agents.unregister(id, token)
    }

    pub fn agent_set_typing(&self, id: &str, token: &str, thread_id: &str) -> Result<bool, Error> {
        self.agents.set_typing(id, token, thread_id)
    }

    /// Returns agents with `token` stripped: `agent.list` never exposes
    /// capability tokens to other callers.
    pub fn agent_list(&self) -> Result<Vec<Agent>, Error> {
        let mut agents = self.agents.list()?;
        for agent in &mut agents {
            agent.token = None;
        }
        Ok(agents)
    }

    pub fn bus_config(&self, version: &str) -> Value {
        serde_json::json!({"preferred_language": "en", "version": version})
    }
}

pub async fn call_with_timeout<T>(fut: impl std::future::Future<Output = Result<T, Error>>) -> Result<T, Error> {
    with_timeout(fut).await
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
