// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Rate limiting, secret-pattern content filtering, and the inactivity
//! sweeper that auto-closes idle `discuss` threads.

use std::sync::Arc;

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::error::Error;
use crate::event_log::EventLog;
use crate::store::Store;

const RATE_WINDOW_SECS: i64 = 60;

/// (label, pattern) in first-match-wins order.
static SECRET_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("AWS Access Key ID", Regex::new(r"AKIA[0-9A-Z]{16}").unwrap()),
        ("AWS Temporary Access Key", Regex::new(r"ASIA[0-9A-Z]{16}").unwrap()),
        ("JWT Token", Regex::new(r"eyJ[A-Za-z0-9_-]{20,}\.eyJ[A-Za-z0-9_-]{20,}").unwrap()),
        ("GitHub Personal Access Token", Regex::new(r"ghp_[A-Za-z0-9]{36}").unwrap()),
        ("GitHub OAuth Token", Regex::new(r"gho_[A-Za-z0-9]{36}").unwrap()),
        ("GitHub App Token", Regex::new(r"ghs_[A-Za-z0-9]{36}").unwrap()),
        ("Private Key", Regex::new(r"-----BEGIN (?:RSA |EC |OPENSSH )?PRIVATE KEY-----").unwrap()),
        ("OpenAI API Key", Regex::new(r"sk-[A-Za-z0-9]{20,}T3BlbkFJ[A-Za-z0-9]{20,}").unwrap()),
        ("Slack Token", Regex::new(r"xox[bprs]-[0-9A-Za-z-]{10,}").unwrap()),
        ("Google API Key", Regex::new(r"AIza[0-9A-Za-z_-]{35}").unwrap()),
        (
            "Azure Storage Key",
            Regex::new(r"[Aa][Zz][Uu][Rr][Ee][A-Za-z0-9_]{10,}=[A-Za-z0-9+/]{43}=").unwrap(),
        ),
    ]
});

pub struct PolicyEngine {
    store: Store,
    events: Arc<EventLog>,
    rate_limit: u32,
    content_filter_enabled: bool,
}

impl PolicyEngine {
    pub fn new(store: Store, events: Arc<EventLog>, rate_limit: u32, content_filter_enabled: bool) -> Self {
        Self { store, events, rate_limit, content_filter_enabled }
    }

    /// Sliding-window (60s) rate check. `scope` is the column name
    /// (`author_id` when resolvable, else `author`) and `key` its value.
    /// `rate_limit == 0` disables the check.
    pub fn rate_check(&self, scope: &str, key: &str) -> Result<(), Error> {
        if self.rate_limit == 0 {
            return Ok(());
        }
        let cutoff = (Utc::now() - Duration::seconds(RATE_WINDOW_SECS)).timestamp();
        let column = match scope {
            "author_id" | "author" => "COALESCE(author_id, author)",
            other => other,
        };
        let key = key.to_string();
        let count: i64 = self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT count(*) FROM messages WHERE {column} = ?1 AND created_at > ?2"),
                rusqlite::params![key, cutoff],
                |row| row.get(0),
            )
        })?;
        if count >= self.rate_limit as i64 {
            return Err(Error::RateLimited {
                limit: self.rate_limit,
                window_s: RATE_WINDOW_SECS as u64,
                retry_after_s: RATE_WINDOW_SECS as u64,
                scope: scope.to_string(),
            });
        }
        Ok(())
    }

    /// Scans `text` against the secret-pattern table; the first match wins.
    pub fn content_check(&self, text: &str) -> Result<(), Error> {
        if !self.content_filter_enabled {
            return Ok(());
        }
        for (label, re) in SECRET_PATTERNS.iter() {
            if re.is_match(text) {
                return Err(Error::ContentBlocked { pattern_label: label.to_string() });
            }
        }
        Ok(())
    }

    /// Closes threads in `discuss` whose most recent activity (latest
    /// message, or thread creation if none) is older than `timeout_minutes`.
    /// Returns empty immediately when `timeout_minutes <= 0`.
    pub fn thread_timeout_sweep(&self, timeout_minutes: i64) -> Result<Vec<String>, Error> {
        if timeout_minutes <= 0 {
            return Ok(Vec::new());
        }
        let cutoff = (Utc::now() - Duration::minutes(timeout_minutes)).timestamp();
        let now = Utc::now();

        let stale: Vec<(String, String)> = self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, topic FROM threads WHERE status = 'discuss' AND \
                 COALESCE((SELECT MAX(created_at) FROM messages WHERE messages.thread_id = threads.id), threads.created_at) < ?1",
            )?;
            let rows = stmt.query_map(rusqlite::params![cutoff], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let mut closed = Vec::with_capacity(stale.len());
        for (thread_id, topic) in stale {
            self.store.with_conn(|conn| {
                conn.execute(
                    "UPDATE threads SET status = 'closed', closed_at = ?1 WHERE id = ?2",
                    rusqlite::params![now.timestamp(), thread_id],
                )
            })?;
            self.events.emit(
                "thread.timeout",
                Some(&thread_id),
                json!({
                    "thread_id": thread_id, "topic": topic, "last_activity": "discuss",
                    "timeout_minutes": timeout_minutes, "closed_at": now.to_rfc3339(),
                }),
            )?;
            closed.push(thread_id);
        }
        Ok(closed)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
