// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Long-poll "wait for the next message" primitive.
//!
//! Event-driven rather than a fixed-interval polling loop: the observable
//! contract (return on new messages or on timeout) is served by subscribing
//! to the live event channel and racing it against a sleep deadline and a
//! cancellation token, the same replay-then-subscribe shape used for the
//! WebSocket stream, adapted here to a single bounded wait instead of an
//! open stream.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio_util::sync::CancellationToken;

use crate::agent_registry::AgentRegistry;
use crate::error::Error;
use crate::event_log::EventLog;
use crate::message_store::MessageStore;
use crate::model::Message;

pub struct WaitCoordinator {
    events: Arc<EventLog>,
    messages: Arc<MessageStore>,
    agents: Arc<AgentRegistry>,
}

impl WaitCoordinator {
    pub fn new(events: Arc<EventLog>, messages: Arc<MessageStore>, agents: Arc<AgentRegistry>) -> Self {
        Self { events, messages, agents }
    }

    /// Blocks until a message with `seq > after_seq` appears in `thread_id`,
    /// `timeout_ms` elapses, or `cancel` fires. The synthetic system-prompt
    /// row is never injected here (only `list(after_seq=0)` does that).
    pub async fn wait(
        &self,
        thread_id: &str,
        after_seq: i64,
        timeout_ms: u64,
        agent_id: Option<&str>,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, Error> {
        if let (Some(id), Some(tok)) = (agent_id, token) {
            // Best-effort: a failed attribution must not fail the wait itself.
            if let Err(e) = self.agents.mark_msg_wait(id, tok) {
                tracing::debug!(agent_id = id, error = %e, "mark_msg_wait failed, continuing wait");
            }
        }

        // Check for already-available messages before subscribing, so a
        // message committed just before this call isn't missed.
        let existing = self.messages.list(thread_id, after_seq, 100, false, None)?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut rx = self.events.subscribe();
        let deadline = tokio::time::sleep(StdDuration::from_millis(timeout_ms));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = &mut deadline => return Ok(Vec::new()),
                event = rx.recv() => {
                    match event {
                        Ok(event) if event.event_type == "msg.new" && event.thread_id.as_deref() == Some(thread_id) => {
                            let fresh = self.messages.list(thread_id, after_seq, 100, false, None)?;
                            if !fresh.is_empty() {
                                return Ok(fresh);
                            }
                        }
                        Ok(_) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                            // Fell behind the broadcast buffer; fall back to a
                            // direct read rather than missing the wake-up.
                            let fresh = self.messages.list(thread_id, after_seq, 100, false, None)?;
                            if !fresh.is_empty() {
                                return Ok(fresh);
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(Vec::new()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
