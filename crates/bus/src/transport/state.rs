// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Shared application state passed to every HTTP/WS handler via axum's
//! `State` extractor.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ResolvedConfig;
use crate::facade::Facade;

/// Shared application state. One instance lives for the process lifetime
/// and is cloned (cheaply, via `Arc`) into every handler.
pub struct AppState {
    pub facade: Arc<Facade>,
    pub config: Arc<ResolvedConfig>,
    pub shutdown: CancellationToken,
}
