// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Bootstrap: wires every core component together, binds the HTTP/WS
//! listener, optionally starts the MCP stdio server, and runs the
//! inactivity sweeper until shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::agent_registry::AgentRegistry;
use crate::config::{Config, ResolvedConfig};
use crate::event_log::EventLog;
use crate::facade::Facade;
use crate::message_store::MessageStore;
use crate::policy::PolicyEngine;
use crate::seq::SeqAllocator;
use crate::store::Store;
use crate::thread_registry::ThreadRegistry;
use crate::transport::build_router;
use crate::transport::mcp;
use crate::transport::state::AppState;
use crate::wait::WaitCoordinator;

/// Initialize tracing/logging from config. Uses `try_init` so it's safe to
/// call multiple times (e.g. from tests).
pub fn init_tracing(config: &ResolvedConfig) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Assembles every core component over an opened [`Store`] into a [`Facade`].
pub fn build_facade(store: Store, config: &ResolvedConfig) -> Arc<Facade> {
    let events = Arc::new(EventLog::new(store.clone()));
    let seq = Arc::new(SeqAllocator::new(store.clone()));
    let agents = Arc::new(AgentRegistry::new(
        store.clone(),
        events.clone(),
        ChronoDuration::seconds(config.heartbeat_timeout_s as i64),
    ));
    let threads = Arc::new(ThreadRegistry::new(store.clone(), events.clone()));
    let policy = Arc::new(PolicyEngine::new(
        store.clone(),
        events.clone(),
        config.rate_limit,
        config.content_filter_enabled,
    ));
    let messages = Arc::new(MessageStore::new(store, events.clone(), agents.clone(), policy.clone(), seq));
    let wait = Arc::new(WaitCoordinator::new(events.clone(), messages.clone(), agents.clone()));

    Arc::new(Facade { threads, messages, agents, policy, events, wait })
}

/// Runs the inactivity sweeper (closes timed-out `discuss` threads) and the
/// event-log prune on a fixed interval until `shutdown` fires.
async fn sweep_loop(facade: Arc<Facade>, config: Arc<ResolvedConfig>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.timeout_sweep_interval_s.max(1)));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => {
                match facade.policy.thread_timeout_sweep(config.thread_timeout_minutes) {
                    Ok(closed) if !closed.is_empty() => {
                        info!(count = closed.len(), "inactivity sweep closed threads");
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "inactivity sweep failed"),
                }
                if let Err(e) = facade.events.prune(ChronoDuration::minutes(10)) {
                    error!(error = %e, "event log prune failed");
                }
            }
        }
    }
}

/// Opens the store, assembles the bus, binds HTTP/WS, optionally starts the
/// MCP stdio server, and runs until shutdown (Ctrl-C).
pub async fn run(config: Config) -> anyhow::Result<()> {
    let resolved = Arc::new(config.resolve()?);
    init_tracing(&resolved);

    let store = Store::open(&resolved.db)?;
    let facade = build_facade(store, &resolved);
    let shutdown = CancellationToken::new();

    tokio::spawn(sweep_loop(facade.clone(), resolved.clone(), shutdown.clone()));

    let state = Arc::new(AppState { facade: facade.clone(), config: resolved.clone(), shutdown: shutdown.clone() });
    let router = build_router(state);
    let addr = format!("{}:{}", resolved.host, resolved.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP listening on {}", listener.local_addr()?);

    let http_shutdown = shutdown.clone();
    let http_task = tokio::spawn(async move {
        let result =
            axum::serve(listener, router).with_graceful_shutdown(http_shutdown.cancelled_owned()).await;
        if let Err(e) = result {
            error!("HTTP server error: {e}");
        }
    });

    let mcp_task = if resolved.mcp_stdio {
        let mcp_facade = facade.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = mcp::serve_stdio(mcp_facade).await {
                error!("MCP server error: {e:#}");
            }
        }))
    } else {
        None
    };

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl-C, shutting down");
                shutdown.cancel();
            }
        }
    });

    let _ = http_task.await;
    if let Some(task) = mcp_task {
        task.abort();
    }
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
