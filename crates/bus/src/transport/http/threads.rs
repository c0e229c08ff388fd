// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Thread lifecycle HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::facade::call_with_timeout;
use crate::transport::{error_response, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub topic: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListThreadsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CloseThreadRequest {
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// `POST /api/v1/threads`
pub async fn create_thread(State(s): State<Arc<AppState>>, Json(req): Json<CreateThreadRequest>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_create(&req.topic, req.metadata, req.system_prompt) }).await {
        Ok(thread) => Json(thread).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `GET /api/v1/threads/:id`
pub async fn get_thread(State(s): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_get(&id) }).await {
        Ok(Some(thread)) => Json(thread).into_response(),
        Ok(None) => error_response(&crate::error::Error::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `GET /api/v1/threads`
pub async fn list_threads(State(s): State<Arc<AppState>>, Query(q): Query<ListThreadsQuery>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_list(q.status.as_deref(), q.include_archived) }).await {
        Ok(threads) => Json(threads).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `PATCH /api/v1/threads/:id/state`
pub async fn set_thread_state(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetStateRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_set_state(&id, &req.state) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/threads/:id/close`
pub async fn close_thread(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CloseThreadRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_close(&id, req.summary) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/threads/:id/archive`
pub async fn archive_thread(State(s): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_archive(&id) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/threads/:id/unarchive`
pub async fn unarchive_thread(State(s): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_unarchive(&id) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `DELETE /api/v1/threads/:id` — the DELETE verb itself is the caller's
/// confirmation; no request body is required.
pub async fn delete_thread(State(s): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.thread_delete(&id, true) }).await {
        Ok(Some(receipt)) => Json(receipt).into_response(),
        Ok(None) => error_response(&crate::error::Error::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[cfg(test)]
#[path = "threads_tests.rs"]
mod tests;
