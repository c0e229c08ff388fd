// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Message post/list/wait HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::facade::call_with_timeout;
use crate::transport::{error_response, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_limit() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default)]
    pub after_seq: i64,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_true")]
    pub include_system_prompt: bool,
}

#[derive(Debug, Deserialize)]
pub struct WaitMessagesQuery {
    #[serde(default)]
    pub after_seq: i64,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// `POST /api/v1/threads/:id/messages`
pub async fn post_message(
    State(s): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async {
        s.facade.msg_post(&thread_id, &req.author, &req.content, req.role.as_deref(), req.metadata)
    })
    .await
    {
        Ok(message) => Json(message).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `GET /api/v1/threads/:id/messages`
pub async fn list_messages(
    State(s): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(q): Query<ListMessagesQuery>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.msg_list(&thread_id, q.after_seq, q.limit, q.include_system_prompt) }).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `GET /api/v1/threads/:id/messages/wait` — long-poll for new messages.
/// Bounded by the server's configured `wait_timeout_s` when the caller omits
/// `timeout_ms`; cancels promptly if the client disconnects mid-wait.
pub async fn wait_messages(
    State(s): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(q): Query<WaitMessagesQuery>,
) -> impl IntoResponse {
    let timeout_ms = q.timeout_ms.unwrap_or(s.config.wait_timeout_s * 1000);
    let cancel = s.shutdown.child_token();
    match s.facade.msg_wait(&thread_id, q.after_seq, timeout_ms, q.agent_id.as_deref(), q.token.as_deref(), &cancel).await
    {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
