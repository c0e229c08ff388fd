// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Agent registration and presence HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::Error;
use crate::facade::call_with_timeout;
use crate::transport::http::OkResponse;
use crate::transport::{error_response, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub ide: String,
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capabilities: Option<serde_json::Value>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AgentTokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SetTypingRequest {
    pub token: String,
    pub thread_id: String,
}

/// `POST /api/v1/agents`
pub async fn register_agent(
    State(s): State<Arc<AppState>>,
    Json(req): Json<RegisterAgentRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async {
        s.facade.agent_register(&req.ide, &req.model, req.description, req.capabilities, req.display_name)
    })
    .await
    {
        Ok(agent) => Json(agent).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `GET /api/v1/agents` — tokens stripped (see [`crate::facade::Facade::agent_list`]).
pub async fn list_agents(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.agent_list() }).await {
        Ok(agents) => Json(agents).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/agents/:id/heartbeat`
pub async fn heartbeat_agent(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AgentTokenRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.agent_heartbeat(&id, &req.token) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::AuthFailed).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/agents/:id/resume`
pub async fn resume_agent(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AgentTokenRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.agent_resume(&id, &req.token) }).await {
        Ok(agent) => Json(agent).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/agents/:id/unregister`
pub async fn unregister_agent(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AgentTokenRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.agent_unregister(&id, &req.token) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::AuthFailed).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// `POST /api/v1/agents/:id/typing` — UI signal only, no presence side effect.
pub async fn set_typing(
    State(s): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetTypingRequest>,
) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.agent_set_typing(&id, &req.token, &req.thread_id) }).await {
        Ok(true) => Json(OkResponse { ok: true }).into_response(),
        Ok(false) => error_response(&Error::AuthFailed).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
