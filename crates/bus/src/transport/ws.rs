// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Resumable WebSocket event stream (`GET /ws/events?after_id=&token=`).
//!
//! Query-string auth on upgrade, then a per-connection loop fanning a
//! broadcast channel out to the socket. One direction only: this stream
//! is read-only, there is no client-to-server message protocol.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::model::Event;
use crate::transport::auth;
use crate::transport::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);
const CATCHUP_LIMIT: u32 = 1000;

fn default_after_id() -> i64 {
    0
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default = "default_after_id")]
    pub after_id: i64,
    pub token: Option<String>,
}

/// `GET /ws/events?after_id=N` — on connect, replays events since `after_id`
/// as a burst of JSON frames, then streams new events as they are emitted.
pub async fn ws_handler(State(state): State<Arc<AppState>>, Query(query): Query<WsQuery>, ws: WebSocketUpgrade) -> impl IntoResponse {
    if let Err(code) = auth::validate_ws_query(
        &query.token.as_ref().map(|t| format!("token={t}")).unwrap_or_default(),
        state.config.auth_token.as_deref(),
    ) {
        return axum::http::Response::builder()
            .status(code.http_status())
            .body(axum::body::Body::from("unauthorized"))
            .unwrap_or_else(|_| axum::http::Response::new(axum::body::Body::empty()))
            .into_response();
    }

    ws.on_upgrade(move |socket| handle_connection(state, query.after_id, socket)).into_response()
}

async fn handle_connection(state: Arc<AppState>, after_id: i64, mut socket: WebSocket) {
    let catchup = match state.facade.events.since(after_id, CATCHUP_LIMIT) {
        Ok(events) => events,
        Err(_) => return,
    };
    for event in &catchup {
        if send_event(&mut socket, event).await.is_err() {
            return;
        }
    }

    let mut rx = state.facade.events.subscribe();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    let shutdown = state.shutdown.child_token();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ping.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &Event) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text.into())).await
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
