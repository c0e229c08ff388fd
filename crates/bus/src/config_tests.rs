// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use clap::Parser;

use super::Config;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn resolve_applies_built_in_defaults_when_nothing_set() {
    let config = parse(&["agentchatbus"]);
    let resolved = config.resolve().expect("resolve");
    assert_eq!(resolved.host, "127.0.0.1");
    assert_eq!(resolved.port, 8089);
    assert_eq!(resolved.rate_limit, 30);
    assert_eq!(resolved.heartbeat_timeout_s, 30);
    assert_eq!(resolved.wait_timeout_s, 300);
    assert!(resolved.content_filter_enabled);
    assert!(!resolved.mcp_stdio);
}

#[test]
fn explicit_flag_overrides_default() {
    let config = parse(&["agentchatbus", "--port", "9999", "--rate-limit", "5"]);
    let resolved = config.resolve().expect("resolve");
    assert_eq!(resolved.port, 9999);
    assert_eq!(resolved.rate_limit, 5);
}

#[test]
fn config_file_fills_in_unset_flags_but_flags_win() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"host": "0.0.0.0", "port": 7000, "rate_limit": 99}"#,
    )
    .expect("write config file");

    let config = parse(&[
        "agentchatbus",
        "--config-file",
        path.to_str().unwrap(),
        "--port",
        "7777",
    ]);
    let resolved = config.resolve().expect("resolve");
    assert_eq!(resolved.host, "0.0.0.0");
    assert_eq!(resolved.port, 7777);
    assert_eq!(resolved.rate_limit, 99);
}

#[test]
fn missing_config_file_path_is_not_an_error() {
    let config = parse(&["agentchatbus", "--config-file", "/nonexistent/path.json"]);
    let resolved = config.resolve().expect("resolve should not fail on missing file");
    assert_eq!(resolved.port, 8089);
}
