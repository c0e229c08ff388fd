// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::sync::Arc;

use axum::http::StatusCode;

use crate::test_support::AnyhowExt;
use crate::transport::build_router;
use crate::transport::test_helpers::test_app_state;

#[tokio::test]
async fn create_then_get_thread_round_trips() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;

    let resp = server.post("/api/v1/threads").json(&serde_json::json!({"topic": "design-review"})).await;
    resp.assert_status(StatusCode::OK);
    let thread: crate::model::Thread = resp.json();

    let resp = server.get(&format!("/api/v1/threads/{}", thread.id)).await;
    resp.assert_status(StatusCode::OK);
    let fetched: crate::model::Thread = resp.json();
    assert_eq!(fetched.topic, "design-review");
    Ok(())
}

#[tokio::test]
async fn get_unknown_thread_is_404() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;

    let resp = server.get("/api/v1/threads/missing").await;
    resp.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_without_prior_create_is_404() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;

    let resp = server.delete("/api/v1/threads/missing").await;
    resp.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn set_state_rejects_unknown_state() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;

    let resp = server.post("/api/v1/threads").json(&serde_json::json!({"topic": "t"})).await;
    let thread: crate::model::Thread = resp.json();

    let resp = server
        .patch(&format!("/api/v1/threads/{}/state", thread.id))
        .json(&serde_json::json!({"state": "bogus"}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn list_threads_excludes_archived_by_default() -> anyhow::Result<()> {
    let state = test_app_state();
    let app = build_router(state);
    let server = axum_test::TestServer::new(app).anyhow()?;

    let resp = server.post("/api/v1/threads").json(&serde_json::json!({"topic": "t"})).await;
    let thread: crate::model::Thread = resp.json();
    server.post(&format!("/api/v1/threads/{}/archive", thread.id)).await.assert_status(StatusCode::OK);

    let resp = server.get("/api/v1/threads").await;
    let threads: Vec<crate::model::Thread> = resp.json();
    assert!(threads.is_empty());

    let resp = server.get("/api/v1/threads?include_archived=true").await;
    let threads: Vec<crate::model::Thread> = resp.json();
    assert_eq!(threads.len(), 1);
    Ok(())
}
