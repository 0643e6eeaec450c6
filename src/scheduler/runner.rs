//! Dispatch loop
//!
//! One `Scheduler` drives one scheduling session: Running while candidates
//! flow, Backoff after a remote rate limit, ending Drained when the source
//! is exhausted or Stopped on a fatal outcome or cancellation.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::action::Action;
use crate::executor::{ExecutionResult, ExecutorAdapter, RemoteActionExecutor};
use crate::policy::Policy;
use crate::quota::QuotaTracker;
use crate::rate::BackoffConfig;
use crate::source::{ActionSource, SourceError};
use crate::stats::{RunSnapshot, RunStats};
use crate::SessionConfig;

use super::CancelToken;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "reason")]
pub enum StopReason {
    /// The source reported no further candidates.
    Drained,
    /// Unrecoverable failure: bad credentials, invalid target, timeout, or
    /// an exhausted reconnect budget.
    Fatal(String),
    /// External stop signal.
    Cancelled,
}

/// Terminal report of one session, for the caller to render. The core
/// itself writes no console or file output for it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(flatten)]
    pub stats: RunSnapshot,
    pub reason: StopReason,
}

/// Outcome of dispatching a single candidate.
enum Dispatch {
    Continue,
    Halt(StopReason),
}

/// Quota-governed dispatch loop over one stream of candidates.
pub struct Scheduler<E> {
    policy: Policy,
    quota: Arc<QuotaTracker>,
    adapter: ExecutorAdapter<E>,
    backoff: BackoffConfig,
    stats: Arc<RunStats>,
    cancel: CancelToken,
}

impl<E: RemoteActionExecutor> Scheduler<E> {
    /// Build a scheduler with its own quota tracker.
    pub fn new(config: &SessionConfig, client: E) -> Self {
        let quota = Arc::new(QuotaTracker::new(config.quotas.clone()));
        Self::with_quota(config, client, quota)
    }

    /// Build a scheduler sharing a quota tracker with other schedulers
    /// (e.g. one loop per action kind over the same account limits).
    pub fn with_quota(config: &SessionConfig, client: E, quota: Arc<QuotaTracker>) -> Self {
        Self {
            policy: config.policy.clone(),
            quota,
            adapter: ExecutorAdapter::new(client, config.execute_timeout()),
            backoff: config.backoff.clone(),
            stats: Arc::new(RunStats::new()),
            cancel: CancelToken::new(),
        }
    }

    /// Handle for cancelling this session from another task.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Live counters, shareable with monitoring tasks.
    pub fn stats(&self) -> Arc<RunStats> {
        self.stats.clone()
    }

    /// Run the session until the source drains, a fatal outcome occurs, or
    /// the cancel token fires. Consumes candidates strictly in source order.
    pub async fn run<S: ActionSource>(&self, source: &mut S) -> SessionSummary {
        info!(session_id = %self.stats.session_id(), "session starting");

        let reason = self.run_loop(source).await;

        let stats = self.stats.snapshot();
        match &reason {
            StopReason::Drained | StopReason::Cancelled => {
                info!(
                    session_id = %stats.session_id,
                    dispatched = stats.total_dispatched,
                    skipped = stats.total_skipped_by_policy,
                    denied = stats.total_denied_by_quota,
                    ?reason,
                    "session ended"
                );
            }
            StopReason::Fatal(why) => {
                error!(
                    session_id = %stats.session_id,
                    dispatched = stats.total_dispatched,
                    reason = %why,
                    "session stopped on fatal outcome"
                );
            }
        }

        SessionSummary { stats, reason }
    }

    async fn run_loop<S: ActionSource>(&self, source: &mut S) -> StopReason {
        loop {
            if self.cancel.is_cancelled() {
                return StopReason::Cancelled;
            }

            let action = match source.next_action().await {
                Ok(Some(action)) => action,
                Ok(None) => return StopReason::Drained,
                Err(SourceError::Terminated { reason }) => return StopReason::Fatal(reason),
            };

            if !self.policy.allows(&action) {
                self.stats.record_policy_skip();
                continue;
            }

            match self.dispatch(&action).await {
                Dispatch::Continue => {}
                Dispatch::Halt(reason) => return reason,
            }
        }
    }

    /// Dispatch one admitted candidate, retrying through backoff on remote
    /// rate limits. Every reservation taken here is committed or released
    /// before this returns, including on cancellation.
    async fn dispatch(&self, action: &Action) -> Dispatch {
        loop {
            if self.cancel.is_cancelled() {
                return Dispatch::Halt(StopReason::Cancelled);
            }

            if !self.quota.try_reserve(action.kind, Instant::now()) {
                self.stats.record_quota_denial();
                return Dispatch::Continue;
            }

            match self.adapter.execute(action).await {
                ExecutionResult::Success => {
                    self.quota.commit(action.kind, Instant::now());
                    self.stats.record_dispatched();
                    return Dispatch::Continue;
                }
                ExecutionResult::RateLimited(retry_after) => {
                    self.quota.release(action.kind, Instant::now());
                    let hits = self.stats.record_rate_limit_hit();
                    let delay = retry_after.unwrap_or_else(|| self.backoff.delay_for(hits));
                    warn!(
                        kind = %action.kind,
                        consecutive_hits = hits,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    if self.cancel.sleep_cancellable(delay).await {
                        return Dispatch::Halt(StopReason::Cancelled);
                    }
                    // Retry the same action; quota may have freed up.
                }
                ExecutionResult::Fatal(reason) => {
                    self.quota.release(action.kind, Instant::now());
                    return Dispatch::Halt(StopReason::Fatal(reason));
                }
            }
        }
    }
}

/// Spawn a session task with panic safety.
///
/// If the run loop panics, the panic is logged rather than propagated and
/// the caller still receives a terminal summary with a fatal reason.
pub fn spawn_session<E, S>(
    scheduler: Scheduler<E>,
    mut source: S,
) -> tokio::task::JoinHandle<SessionSummary>
where
    E: RemoteActionExecutor + 'static,
    S: ActionSource + 'static,
{
    let stats = scheduler.stats();

    tokio::spawn(async move {
        let run = std::panic::AssertUnwindSafe(async { scheduler.run(&mut source).await });

        use futures::FutureExt;
        match run.catch_unwind().await {
            Ok(summary) => summary,
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };

                error!(session_id = %stats.session_id(), panic = %panic_msg, "session panicked");

                SessionSummary {
                    stats: stats.snapshot(),
                    reason: StopReason::Fatal(format!("session panicked: {panic_msg}")),
                }
            }
        }
    })
}
