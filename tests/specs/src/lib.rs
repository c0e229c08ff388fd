// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `agentchatbus` binary as a subprocess and exercises it
//! over its HTTP and WebSocket surfaces, the way a real IDE agent or CLI
//! client would.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Resolve the path to the compiled `agentchatbus` binary.
pub fn bus_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("agentchatbus")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A running `agentchatbus` process that is killed on drop.
pub struct BusProcess {
    child: Child,
    port: u16,
    _db_dir: tempfile::TempDir,
}

impl BusProcess {
    /// Spawns the bus with a fresh temp-file database, bound to a free
    /// loopback port. `auth_token` is forwarded as-is (`None` disables
    /// auth, matching the bus's own default for local use).
    pub fn start(auth_token: Option<&str>) -> anyhow::Result<Self> {
        let binary = bus_binary();
        anyhow::ensure!(binary.exists(), "agentchatbus binary not found at {}", binary.display());

        let port = free_port()?;
        let db_dir = tempfile::tempdir()?;
        let db_path = db_dir.path().join("bus.db");

        let mut cmd = Command::new(&binary);
        cmd.args([
            "--host",
            "127.0.0.1",
            "--port",
            &port.to_string(),
            "--db",
            db_path.to_str().expect("utf8 temp path"),
            "--log-format",
            "text",
            "--log-level",
            "warn",
            "--heartbeat-timeout-s",
            "2",
            "--rate-limit",
            "0",
        ]);
        if let Some(tok) = auth_token {
            cmd.args(["--auth-token", tok]);
        }
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn()?;
        Ok(Self { child, port, _db_dir: db_dir })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws/events", self.port)
    }

    /// Polls `/api/v1/health` until it answers or `timeout` elapses.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("agentchatbus did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for BusProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
