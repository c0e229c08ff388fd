// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use super::*;
use serde_json::json;

fn log() -> EventLog {
    EventLog::new(Store::open_in_memory().expect("store"))
}

#[test]
fn emit_assigns_strictly_increasing_ids() {
    let log = log();
    let e1 = log.emit("thread.new", None, json!({"a": 1})).expect("emit1");
    let e2 = log.emit("thread.new", None, json!({"a": 2})).expect("emit2");
    assert!(e2.id > e1.id);
}

#[test]
fn since_returns_only_newer_events() {
    let log = log();
    let e1 = log.emit("thread.new", None, json!({})).expect("emit1");
    let e2 = log.emit("thread.new", None, json!({})).expect("emit2");
    let e3 = log.emit("thread.new", None, json!({})).expect("emit3");

    let events = log.since(e1.id, 10).expect("since");
    assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![e2.id, e3.id]);
}

#[test]
fn since_respects_limit() {
    let log = log();
    for _ in 0..5 {
        log.emit("thread.new", None, json!({})).expect("emit");
    }
    let events = log.since(0, 2).expect("since");
    assert_eq!(events.len(), 2);
}

#[test]
fn prune_deletes_only_old_rows() {
    let log = log();
    log.emit("thread.new", None, json!({})).expect("emit");
    let deleted = log.prune(Duration::seconds(-1)).expect("prune");
    assert_eq!(deleted, 1);
    assert!(log.since(0, 10).expect("since").is_empty());
}

#[test]
fn subscribe_receives_live_emits() {
    let log = log();
    let mut rx = log.subscribe();
    let emitted = log.emit("msg.new", Some("t1"), json!({"seq": 1})).expect("emit");
    let received = rx.try_recv().expect("recv");
    assert_eq!(received.id, emitted.id);
}
