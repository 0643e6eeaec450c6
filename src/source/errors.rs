//! Stream source error types

use thiserror::Error;

/// Terminal failure of a stream source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("stream terminated: {reason}")]
    Terminated { reason: String },
}

/// Errors reported by the transport beneath a stream source.
///
/// These are recoverable while the source's retry ceiling allows; past it
/// they escalate into `SourceError::Terminated`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("request failed: {0}")]
    RequestFailed(String),
}
