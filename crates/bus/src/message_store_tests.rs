// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::agent_registry::AgentRegistry;
use crate::policy::PolicyEngine;
use crate::seq::SeqAllocator;

fn harness() -> (Store, Arc<AgentRegistry>, MessageStore) {
    let store = Store::open_in_memory().expect("store");
    let events = Arc::new(EventLog::new(store.clone()));
    let agents = Arc::new(AgentRegistry::new(store.clone(), events.clone(), chrono::Duration::seconds(30)));
    let policy = Arc::new(PolicyEngine::new(store.clone(), events.clone(), 0, false));
    let seq = Arc::new(SeqAllocator::new(store.clone()));
    let messages = MessageStore::new(store.clone(), events, agents.clone(), policy, seq);
    store
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO threads (id, topic, status, created_at) VALUES ('t1', 'topic', 'discuss', 0)",
                [],
            )?;
            conn.execute(
                "INSERT INTO threads (id, topic, status, created_at) VALUES ('t2', 'other', 'discuss', 0)",
                [],
            )
        })
        .expect("seed threads");
    (store, agents, messages)
}

#[test]
fn append_resolves_registered_author_to_agent_identity() {
    let (_store, agents, messages) = harness();
    let agent = agents.register("vscode", "claude", None, None, None).expect("register");

    let msg = messages.append("t1", &agent.id, "hello", "user", None).expect("append");
    assert_eq!(msg.author, agent.name);
    assert_eq!(msg.author_id.as_deref(), Some(agent.id.as_str()));
    assert_eq!(msg.author_name, agent.display_name);
}

#[test]
fn append_passes_through_non_agent_author_verbatim() {
    let (_store, _agents, messages) = harness();
    let msg = messages.append("t1", "human", "hi there", "user", None).expect("append");
    assert_eq!(msg.author, "human");
    assert!(msg.author_id.is_none());
    assert_eq!(msg.author_name, "human");
}

#[test]
fn append_updates_agent_activity_to_msg_post() {
    let (_store, agents, messages) = harness();
    let agent = agents.register("vscode", "claude", None, None, None).expect("register");
    messages.append("t1", &agent.id, "hello", "user", None).expect("append");
    let reloaded = agents.get(&agent.id).expect("get").expect("exists");
    assert_eq!(reloaded.last_activity, "msg_post");
}

#[test]
fn seq_is_global_across_threads_not_per_thread() {
    let (_store, _agents, messages) = harness();
    let m1 = messages.append("t1", "human", "a", "user", None).expect("append t1");
    let m2 = messages.append("t2", "human", "b", "user", None).expect("append t2");
    let m3 = messages.append("t1", "human", "c", "user", None).expect("append t1 again");
    assert!(m1.seq < m2.seq);
    assert!(m2.seq < m3.seq);
}

#[test]
fn list_returns_only_messages_after_given_seq_in_ascending_order() {
    let (_store, _agents, messages) = harness();
    let m1 = messages.append("t1", "human", "one", "user", None).expect("append");
    let m2 = messages.append("t1", "human", "two", "user", None).expect("append");

    let listed = messages.list("t1", m1.seq, 100, false, None).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, m2.id);
}

#[test]
fn list_prepends_synthetic_prompt_only_at_seq_zero() {
    let (_store, _agents, messages) = harness();
    messages.append("t1", "human", "hi", "user", None).expect("append");

    let from_start = messages.list("t1", 0, 100, true, None).expect("list");
    assert_eq!(from_start[0].seq, 0);
    assert_eq!(from_start[0].role, "system");

    let from_one = messages.list("t1", 1, 100, true, None).expect("list");
    assert!(from_one.iter().all(|m| m.seq != 0));
}

#[test]
fn list_limit_zero_returns_only_the_synthetic_row() {
    let (_store, _agents, messages) = harness();
    messages.append("t1", "human", "hi", "user", None).expect("append");
    let listed = messages.list("t1", 0, 0, true, None).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].seq, 0);
}

#[test]
fn synthetic_prompt_is_never_persisted() {
    let (store, _agents, messages) = harness();
    messages.append("t1", "human", "hi", "user", None).expect("append");
    messages.list("t1", 0, 100, true, None).expect("list with prompt");

    let count: i64 = store
        .with_conn(|conn| conn.query_row("SELECT count(*) FROM messages WHERE seq = 0", [], |r| r.get(0)))
        .expect("query");
    assert_eq!(count, 0);
}

#[test]
fn empty_content_is_accepted() {
    let (_store, _agents, messages) = harness();
    let msg = messages.append("t1", "human", "", "user", None).expect("append");
    assert_eq!(msg.content, "");
}
