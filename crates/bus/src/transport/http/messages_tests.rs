// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use axum::http::StatusCode;

use crate::test_support::AnyhowExt;
use crate::transport::build_router;
use crate::transport::test_helpers::test_app_state;

async fn make_thread(server: &axum_test::TestServer) -> crate::model::Thread {
    server.post("/api/v1/threads").json(&serde_json::json!({"topic": "t"})).await.json()
}

#[tokio::test]
async fn post_then_list_messages_round_trips() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;
    let thread = make_thread(&server).await;

    let resp = server
        .post(&format!("/api/v1/threads/{}/messages", thread.id))
        .json(&serde_json::json!({"author": "alice", "content": "hello"}))
        .await;
    resp.assert_status(StatusCode::OK);
    let message: crate::model::Message = resp.json();
    assert_eq!(message.content, "hello");
    assert_eq!(message.role, "user");

    let resp = server.get(&format!("/api/v1/threads/{}/messages?include_system_prompt=false", thread.id)).await;
    let messages: Vec<crate::model::Message> = resp.json();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");
    Ok(())
}

#[tokio::test]
async fn post_message_on_unknown_thread_is_404() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;

    let resp = server
        .post("/api/v1/threads/missing/messages")
        .json(&serde_json::json!({"author": "alice", "content": "hi"}))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn post_message_rejects_unknown_role() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;
    let thread = make_thread(&server).await;

    let resp = server
        .post(&format!("/api/v1/threads/{}/messages", thread.id))
        .json(&serde_json::json!({"author": "alice", "content": "hi", "role": "bogus"}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn wait_messages_returns_immediately_when_already_available() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;
    let thread = make_thread(&server).await;

    server
        .post(&format!("/api/v1/threads/{}/messages", thread.id))
        .json(&serde_json::json!({"author": "alice", "content": "hi"}))
        .await;

    let resp = server.get(&format!("/api/v1/threads/{}/messages/wait?after_seq=0&timeout_ms=1000", thread.id)).await;
    resp.assert_status(StatusCode::OK);
    let messages: Vec<crate::model::Message> = resp.json();
    assert_eq!(messages.len(), 1);
    Ok(())
}
