//! Remote client error types

use std::time::Duration;

use thiserror::Error;

/// Errors a remote client implementation may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("rate limit exceeded")]
    RateLimited {
        /// Retry hint from the remote signal, when provided.
        retry_after: Option<Duration>,
    },

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("transport failure: {0}")]
    Transport(String),
}
