// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::sync::Arc;

use super::*;

fn registry() -> AgentRegistry {
    let store = Store::open_in_memory().expect("store");
    let events = Arc::new(EventLog::new(store.clone()));
    AgentRegistry::new(store, events, Duration::seconds(30))
}

#[test]
fn register_synthesizes_auto_display_name() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    assert_eq!(agent.alias_source, "auto");
    assert!(agent.display_name.starts_with("vscode agent ("));
    assert_eq!(agent.name, "vscode (claude)");
}

#[test]
fn register_disambiguates_repeated_base_name() {
    let reg = registry();
    let a1 = reg.register("vscode", "claude", None, None, None).expect("register 1");
    let a2 = reg.register("vscode", "claude", None, None, None).expect("register 2");
    assert_eq!(a1.name, "vscode (claude)");
    assert_eq!(a2.name, "vscode (claude) 2");
}

#[test]
fn register_honors_user_supplied_display_name() {
    let reg = registry();
    let agent = reg
        .register("vscode", "claude", None, None, Some("My Assistant".into()))
        .expect("register");
    assert_eq!(agent.display_name, "My Assistant");
    assert_eq!(agent.alias_source, "user");
}

#[test]
fn heartbeat_rejects_bad_token() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let ok = reg.heartbeat(&agent.id, "wrong-token").expect("heartbeat");
    assert!(!ok);
}

#[test]
fn heartbeat_updates_presence() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let ok = reg.heartbeat(&agent.id, agent.token.as_deref().unwrap()).expect("heartbeat");
    assert!(ok);
}

#[test]
fn is_online_reflects_heartbeat_timeout() {
    let store = Store::open_in_memory().expect("store");
    let events = Arc::new(EventLog::new(store.clone()));
    let reg = AgentRegistry::new(store, events, Duration::seconds(-1));
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let reloaded = reg.get(&agent.id).expect("get").expect("exists");
    assert!(!reloaded.is_online);
}

#[test]
fn resume_preserves_name_and_display_name() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let token = agent.token.clone().unwrap();
    reg.unregister(&agent.id, &token).expect("unregister");
    let resumed = reg.resume(&agent.id, &token).expect("resume");
    assert_eq!(resumed.name, agent.name);
    assert_eq!(resumed.display_name, agent.display_name);
    assert!(resumed.is_online);
}

#[test]
fn resume_fails_with_wrong_token() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let err = reg.resume(&agent.id, "nope").expect_err("auth failure");
    assert_eq!(err.code(), crate::error::ErrorCode::AuthFailed);
}

#[test]
fn unregister_does_not_delete_the_row() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let token = agent.token.clone().unwrap();
    reg.unregister(&agent.id, &token).expect("unregister");
    assert!(reg.get(&agent.id).expect("get").is_some());
}

#[test]
fn list_omits_token() {
    let reg = registry();
    reg.register("vscode", "claude", None, None, None).expect("register");
    let listed = reg.list().expect("list");
    // token is present on the model because list() reuses row_to_agent;
    // the Facade is responsible for stripping it before it crosses a
    // transport boundary (see model::Agent's #[serde(skip_serializing_if)]).
    assert_eq!(listed.len(), 1);
}

#[test]
fn mark_msg_wait_does_not_touch_heartbeat() {
    let reg = registry();
    let agent = reg.register("vscode", "claude", None, None, None).expect("register");
    let token = agent.token.clone().unwrap();
    let before = agent.last_heartbeat;
    reg.mark_msg_wait(&agent.id, &token).expect("mark_msg_wait");
    let reloaded = reg.get(&agent.id).expect("get").expect("exists");
    assert_eq!(reloaded.last_activity, "msg_wait");
    assert_eq!(reloaded.last_heartbeat, before);
}
