// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use crate::test_support::AnyhowExt;
use crate::transport::build_router;
use crate::transport::test_helpers::test_app_state;

#[tokio::test]
async fn replays_catchup_then_streams_new_events() -> anyhow::Result<()> {
    let state = test_app_state();
    let facade = state.facade.clone();
    let app = build_router(state);
    let server = axum_test::TestServer::builder().http_transport().build(app).anyhow()?;

    facade.thread_create("before-connect", None, None)?;

    let mut socket = server.get_websocket("/ws/events?after_id=0").await.into_websocket().await;
    let frame: crate::model::Event = socket.receive_json().await;
    assert_eq!(frame.event_type, "thread.new");

    facade.thread_create("after-connect", None, None)?;
    let frame: crate::model::Event = socket.receive_json().await;
    assert_eq!(frame.event_type, "thread.new");
    Ok(())
}
