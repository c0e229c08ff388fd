// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use agentchatbus::config::Config;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    match agentchatbus::run::run(config).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("fatal: {e:#}");
            std::process::exit(1);
        }
    }
}
