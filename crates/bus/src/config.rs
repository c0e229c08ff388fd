// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Process configuration: CLI flags (via `clap`), environment variables,
//! and a JSON config-file fallback — a `clap::Parser` struct, one field
//! per option, each with a matching env var.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// AgentChatBus: a local multi-agent communication bus.
#[derive(Debug, Parser)]
#[command(name = "agentchatbus", version, about)]
pub struct Config {
    /// Host address to bind to.
    #[arg(long, env = "AGENTCHATBUS_HOST")]
    pub host: Option<String>,

    /// HTTP/WS port to listen on.
    #[arg(long, env = "AGENTCHATBUS_PORT")]
    pub port: Option<u16>,

    /// SQLite database file path.
    #[arg(long, env = "AGENTCHATBUS_DB")]
    pub db: Option<PathBuf>,

    /// Bearer token gating every route except `/api/v1/health`. Unset
    /// disables auth for local single-user deployments.
    #[arg(long, env = "AGENTCHATBUS_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Seconds since `last_heartbeat` after which an agent is offline.
    #[arg(long, env = "AGENTCHATBUS_HEARTBEAT_TIMEOUT")]
    pub heartbeat_timeout_s: Option<u64>,

    /// Default long-poll ceiling (seconds) when a caller omits `timeout_ms`.
    #[arg(long, env = "AGENTCHATBUS_WAIT_TIMEOUT")]
    pub wait_timeout_s: Option<u64>,

    /// Messages/minute per author before `RateLimited` (0 disables).
    #[arg(long, env = "AGENTCHATBUS_RATE_LIMIT")]
    pub rate_limit: Option<u32>,

    /// Enable secret-pattern content filtering on posted messages.
    #[arg(long, env = "AGENTCHATBUS_CONTENT_FILTER_ENABLED")]
    pub content_filter_enabled: Option<bool>,

    /// Minutes of inactivity before a `discuss` thread auto-closes (0 disables).
    #[arg(long, env = "AGENTCHATBUS_THREAD_TIMEOUT")]
    pub thread_timeout_minutes: Option<i64>,

    /// Seconds between inactivity-sweeper runs.
    #[arg(long, env = "AGENTCHATBUS_TIMEOUT_SWEEP_INTERVAL")]
    pub timeout_sweep_interval_s: Option<u64>,

    /// Start the MCP tool server over stdio alongside the HTTP listener.
    #[arg(long, env = "AGENTCHATBUS_MCP_STDIO")]
    pub mcp_stdio: Option<bool>,

    /// Log format (json or text).
    #[arg(long, env = "AGENTCHATBUS_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "AGENTCHATBUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// JSON config file filling in anything left unset by flags/env.
    #[arg(long, env = "AGENTCHATBUS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// On-disk JSON layering source. Every field optional; present keys fill
/// in whatever flags/env left unset.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    db: Option<PathBuf>,
    auth_token: Option<String>,
    heartbeat_timeout_s: Option<u64>,
    wait_timeout_s: Option<u64>,
    rate_limit: Option<u32>,
    content_filter_enabled: Option<bool>,
    thread_timeout_minutes: Option<i64>,
    timeout_sweep_interval_s: Option<u64>,
    mcp_stdio: Option<bool>,
    log_format: Option<String>,
    log_level: Option<String>,
}

/// Fully resolved configuration: every option has a concrete value after
/// flags/env are layered over the config file, which is layered over
/// hard-coded defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub port: u16,
    pub db: PathBuf,
    pub auth_token: Option<String>,
    pub heartbeat_timeout_s: u64,
    pub wait_timeout_s: u64,
    pub rate_limit: u32,
    pub content_filter_enabled: bool,
    pub thread_timeout_minutes: i64,
    pub timeout_sweep_interval_s: u64,
    pub mcp_stdio: bool,
    pub log_format: String,
    pub log_level: String,
}

impl Config {
    /// Reads the config file (if any), then resolves every option: flags/env
    /// win over the file, the file wins over these built-in defaults.
    pub fn resolve(&self) -> anyhow::Result<ResolvedConfig> {
        let file = self.load_config_file()?;

        Ok(ResolvedConfig {
            host: self.host.clone().or(file.host).unwrap_or_else(|| "127.0.0.1".to_string()),
            port: self.port.or(file.port).unwrap_or(8089),
            db: self.db.clone().or(file.db).unwrap_or_else(|| PathBuf::from("agentchatbus.db")),
            auth_token: self.auth_token.clone().or(file.auth_token),
            heartbeat_timeout_s: self.heartbeat_timeout_s.or(file.heartbeat_timeout_s).unwrap_or(30),
            wait_timeout_s: self.wait_timeout_s.or(file.wait_timeout_s).unwrap_or(300),
            rate_limit: self.rate_limit.or(file.rate_limit).unwrap_or(30),
            content_filter_enabled: self.content_filter_enabled.or(file.content_filter_enabled).unwrap_or(true),
            thread_timeout_minutes: self.thread_timeout_minutes.or(file.thread_timeout_minutes).unwrap_or(60),
            timeout_sweep_interval_s: self.timeout_sweep_interval_s.or(file.timeout_sweep_interval_s).unwrap_or(60),
            mcp_stdio: self.mcp_stdio.or(file.mcp_stdio).unwrap_or(false),
            log_format: self.log_format.clone().or(file.log_format).unwrap_or_else(|| "json".to_string()),
            log_level: self.log_level.clone().or(file.log_level).unwrap_or_else(|| "info".to_string()),
        })
    }

    fn load_config_file(&self) -> anyhow::Result<ConfigFile> {
        let Some(path) = &self.config_file else { return Ok(ConfigFile::default()) };
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
