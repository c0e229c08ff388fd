// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Unified error taxonomy shared across the Store, the core components,
//! and every transport (HTTP, WebSocket, MCP).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors returned by any Facade operation.
///
/// Every variant maps to exactly one [`ErrorCode`] (see [`Error::code`]);
/// transports translate the code into their own wire format rather than
/// matching on `Error` directly.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum Error {
    /// The referenced thread, message, or agent does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A malformed or out-of-domain argument (e.g. an unknown thread state).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An agent id/token pair did not match. Never reveals which half failed.
    #[error("authentication failed")]
    AuthFailed,

    /// The author has exceeded the sliding-window message rate.
    #[error("rate limited: {limit} messages per {window_s}s")]
    RateLimited {
        limit: u32,
        window_s: u64,
        retry_after_s: u64,
        scope: String,
    },

    /// The message content matched a blocked secret pattern.
    #[error("content blocked: {pattern_label}")]
    ContentBlocked { pattern_label: String },

    /// A store or request operation exceeded its timeout budget.
    #[error("operation timed out")]
    Timeout,

    /// An unexpected durable-layer failure.
    #[error("store error: {0}")]
    StoreError(String),

    /// The request was cancelled by its transport before completing.
    #[error("cancelled")]
    Cancelled,
}

/// The stable, wire-safe classification of an [`Error`].
///
/// Kept separate from `Error` itself so transports can exhaustively match
/// on a small, `Copy` enum instead of the full error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    AuthFailed,
    RateLimited,
    ContentBlocked,
    Timeout,
    StoreError,
    Cancelled,
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::AuthFailed => ErrorCode::AuthFailed,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::ContentBlocked { .. } => ErrorCode::ContentBlocked,
            Self::Timeout => ErrorCode::Timeout,
            Self::StoreError(_) => ErrorCode::StoreError,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }
}

impl ErrorCode {
    /// HTTP status this error code should be reported as.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput => 400,
            Self::AuthFailed => 401,
            Self::RateLimited => 429,
            Self::ContentBlocked => 422,
            Self::Timeout => 504,
            Self::StoreError => 500,
            // Non-standard but conventional for "client closed request".
            Self::Cancelled => 499,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::AuthFailed => "auth_failed",
            Self::RateLimited => "rate_limited",
            Self::ContentBlocked => "content_blocked",
            Self::Timeout => "timeout",
            Self::StoreError => "store_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StoreError(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
