//! Executor adapter
//!
//! Converts a requested action into exactly one remote call and classifies
//! the response. Retry policy lives in the scheduler; the adapter never
//! retries and never raises beyond the `ExecutionResult` mapping.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::action::{Action, ActionKind, TargetRef};

use super::RemoteError;

/// Capability the remote client must provide: one method per action kind.
///
/// The core depends only on this surface, never on the concrete protocol
/// behind it.
#[async_trait]
pub trait RemoteActionExecutor: Send + Sync {
    async fn like(&self, target: &TargetRef) -> Result<(), RemoteError>;
    async fn comment(&self, target: &TargetRef, text: &str) -> Result<(), RemoteError>;
    async fn follow(&self, target: &TargetRef) -> Result<(), RemoteError>;
    async fn favorite(&self, target: &TargetRef) -> Result<(), RemoteError>;
    async fn post(&self, text: &str) -> Result<(), RemoteError>;
}

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success,
    /// Remote asked us to slow down; `retry_after` is its hint if given.
    RateLimited(Option<Duration>),
    /// Unrecoverable: bad credentials, permanently invalid target, timeout.
    Fatal(String),
}

/// Wraps a remote client, bounding each call with a timeout.
pub struct ExecutorAdapter<E> {
    client: E,
    call_timeout: Duration,
}

impl<E: RemoteActionExecutor> ExecutorAdapter<E> {
    pub fn new(client: E, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    /// Access the wrapped client.
    pub fn client_ref(&self) -> &E {
        &self.client
    }

    /// Perform the action's remote call and classify the result.
    ///
    /// A call that outlives the timeout is `Fatal`: a hung remote is not
    /// retried indefinitely.
    pub async fn execute(&self, action: &Action) -> ExecutionResult {
        let outcome = match tokio::time::timeout(self.call_timeout, self.dispatch(action)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(kind = %action.kind, target_id = %action.target.id, "remote call timed out");
                return ExecutionResult::Fatal(format!(
                    "remote call timed out after {}ms",
                    self.call_timeout.as_millis()
                ));
            }
        };

        match outcome {
            Ok(()) => {
                debug!(kind = %action.kind, target_id = %action.target.id, "dispatched");
                ExecutionResult::Success
            }
            Err(RemoteError::RateLimited { retry_after }) => {
                debug!(kind = %action.kind, ?retry_after, "remote rate limited");
                ExecutionResult::RateLimited(retry_after)
            }
            Err(err) => {
                warn!(kind = %action.kind, error = %err, "remote call failed");
                ExecutionResult::Fatal(err.to_string())
            }
        }
    }

    async fn dispatch(&self, action: &Action) -> Result<(), RemoteError> {
        match action.kind {
            ActionKind::Like => self.client.like(&action.target).await,
            ActionKind::Comment => match &action.payload {
                Some(text) => self.client.comment(&action.target, text).await,
                None => Err(RemoteError::InvalidTarget(
                    "comment action without payload".into(),
                )),
            },
            ActionKind::Follow => self.client.follow(&action.target).await,
            ActionKind::Favorite => self.client.favorite(&action.target).await,
            ActionKind::Post => match &action.payload {
                Some(text) => self.client.post(text).await,
                None => Err(RemoteError::InvalidTarget(
                    "post action without payload".into(),
                )),
            },
        }
    }
}
