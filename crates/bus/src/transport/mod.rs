// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! HTTP/REST, WebSocket event-stream, and MCP transports — thin
//! translators over the [`crate::facade::Facade`]; no business logic lives
//! here.

pub mod auth;
pub mod http;
pub mod mcp;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::{Error, ErrorCode};
use state::AppState;

/// Top-level error response envelope shared across HTTP and WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body containing a machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorCode {
    /// Convert this error code into a transport [`ErrorBody`].
    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    /// Convert this error code into an axum JSON error response.
    pub fn to_http_response(&self, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

/// Translates a core [`Error`] into the JSON response every HTTP handler
/// returns on failure.
pub fn error_response(err: &Error) -> (StatusCode, Json<ErrorResponse>) {
    err.code().to_http_response(err.to_string())
}

/// Build the axum `Router` with every HTTP and WebSocket route.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::health))
        .route("/api/v1/config", get(http::bus_config))
        .route("/api/v1/events/catchup", get(http::catchup_events))
        .route("/api/v1/threads", post(http::create_thread).get(http::list_threads))
        .route("/api/v1/threads/{id}", get(http::get_thread).delete(http::delete_thread))
        .route("/api/v1/threads/{id}/state", patch(http::set_thread_state))
        .route("/api/v1/threads/{id}/close", post(http::close_thread))
        .route("/api/v1/threads/{id}/archive", post(http::archive_thread))
        .route("/api/v1/threads/{id}/unarchive", post(http::unarchive_thread))
        .route("/api/v1/threads/{id}/messages", post(http::post_message).get(http::list_messages))
        .route("/api/v1/threads/{id}/messages/wait", get(http::wait_messages))
        .route("/api/v1/agents", post(http::register_agent).get(http::list_agents))
        .route("/api/v1/agents/{id}/heartbeat", post(http::heartbeat_agent))
        .route("/api/v1/agents/{id}/resume", post(http::resume_agent))
        .route("/api/v1/agents/{id}/unregister", post(http::unregister_agent))
        .route("/api/v1/agents/{id}/typing", post(http::set_typing))
        .route("/ws/events", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use crate::config::ResolvedConfig;
    use crate::facade::Facade;
    use crate::run::build_facade;
    use crate::store::Store;

    use super::state::AppState;

    /// An in-memory-backed [`AppState`] for router-level integration tests.
    pub fn test_app_state() -> Arc<AppState> {
        let store = Store::open_in_memory().expect("open in-memory store");
        let config = Arc::new(ResolvedConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            db: std::path::PathBuf::from(":memory:"),
            auth_token: None,
            heartbeat_timeout_s: 30,
            wait_timeout_s: 5,
            rate_limit: 0,
            content_filter_enabled: true,
            thread_timeout_minutes: 60,
            timeout_sweep_interval_s: 60,
            mcp_stdio: false,
            log_format: "text".to_string(),
            log_level: "error".to_string(),
        });
        let facade: Arc<Facade> = build_facade(store, &config);
        Arc::new(AppState { facade, config, shutdown: CancellationToken::new() })
    }
}
