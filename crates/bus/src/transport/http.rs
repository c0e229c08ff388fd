// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! HTTP request/response types and axum handler implementations.

mod agents;
mod events;
mod messages;
mod threads;

pub use agents::*;
pub use events::*;
pub use messages::*;
pub use threads::*;

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::transport::state::AppState;

/// `GET /api/v1/health` — liveness probe. Always 200, never gated by auth.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "running" }))
}

/// `GET /api/v1/config` — the bus's self-reported configuration summary.
pub async fn bus_config(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.facade.bus_config(env!("CARGO_PKG_VERSION")))
}
