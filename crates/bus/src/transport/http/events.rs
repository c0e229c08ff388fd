// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Event log catchup HTTP handler.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::facade::call_with_timeout;
use crate::transport::{error_response, state::AppState};

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCatchupQuery {
    #[serde(default)]
    pub after_id: i64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// `GET /api/v1/events/catchup?after_id=&limit=` — one-shot catch-up read,
/// a thin wrapper over [`crate::event_log::EventLog::since`].
pub async fn catchup_events(State(s): State<Arc<AppState>>, Query(q): Query<EventCatchupQuery>) -> impl IntoResponse {
    match call_with_timeout(async { s.facade.events.since(q.after_id, q.limit) }).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
