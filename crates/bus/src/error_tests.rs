// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    not_found = { ErrorCode::NotFound, 404 },
    invalid_input = { ErrorCode::InvalidInput, 400 },
    auth_failed = { ErrorCode::AuthFailed, 401 },
    rate_limited = { ErrorCode::RateLimited, 429 },
    content_blocked = { ErrorCode::ContentBlocked, 422 },
    timeout = { ErrorCode::Timeout, 504 },
    store_error = { ErrorCode::StoreError, 500 },
    cancelled = { ErrorCode::Cancelled, 499 },
)]
fn http_status_matches_taxonomy(code: ErrorCode, expected: u16) {
    assert_eq!(code.http_status(), expected);
}

#[test]
fn rate_limited_carries_fields() {
    let err = Error::RateLimited { limit: 30, window_s: 60, retry_after_s: 60, scope: "author_id".into() };
    assert_eq!(err.code(), ErrorCode::RateLimited);
    assert!(err.to_string().contains("30"));
}

#[test]
fn content_blocked_carries_label() {
    let err = Error::ContentBlocked { pattern_label: "Private Key".into() };
    assert_eq!(err.code(), ErrorCode::ContentBlocked);
    assert!(err.to_string().contains("Private Key"));
}

#[test]
fn auth_failed_message_does_not_leak_detail() {
    let err = Error::AuthFailed;
    assert_eq!(err.to_string(), "authentication failed");
}

#[test]
fn store_error_wraps_rusqlite() {
    let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
    let err: Error = sqlite_err.into();
    assert_eq!(err.code(), ErrorCode::StoreError);
}
