//! Session run statistics
//!
//! Counters for one scheduling session, tracked with atomics so the caller
//! can snapshot them while the dispatch loop runs. Created at session start
//! and discarded at session end; never persisted across runs.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Live counters for one scheduling session.
#[derive(Debug)]
pub struct RunStats {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    dispatched: AtomicU64,
    skipped_by_policy: AtomicU64,
    denied_by_quota: AtomicU64,
    rate_limit_hits: AtomicU32,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            dispatched: AtomicU64::new(0),
            skipped_by_policy: AtomicU64::new(0),
            denied_by_quota: AtomicU64::new(0),
            rate_limit_hits: AtomicU32::new(0),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Record a successfully dispatched action; resets the rate-limit streak.
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.rate_limit_hits.store(0, Ordering::Relaxed);
    }

    pub fn record_policy_skip(&self) {
        self.skipped_by_policy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_quota_denial(&self) {
        self.denied_by_quota.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rate-limit hit; returns the new consecutive streak.
    pub fn record_rate_limit_hit(&self) -> u32 {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn total_dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn total_skipped_by_policy(&self) -> u64 {
        self.skipped_by_policy.load(Ordering::Relaxed)
    }

    pub fn total_denied_by_quota(&self) -> u64 {
        self.denied_by_quota.load(Ordering::Relaxed)
    }

    pub fn consecutive_rate_limit_hits(&self) -> u32 {
        self.rate_limit_hits.load(Ordering::Relaxed)
    }

    /// Get snapshot for serialization
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            session_id: self.session_id,
            started_at: self.started_at,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            total_dispatched: self.total_dispatched(),
            total_skipped_by_policy: self.total_skipped_by_policy(),
            total_denied_by_quota: self.total_denied_by_quota(),
            consecutive_rate_limit_hits: self.consecutive_rate_limit_hits(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of session counters
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub total_dispatched: u64,
    pub total_skipped_by_policy: u64,
    pub total_denied_by_quota: u64,
    pub consecutive_rate_limit_hits: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = RunStats::new();
        stats.record_dispatched();
        stats.record_dispatched();
        stats.record_policy_skip();
        stats.record_quota_denial();

        assert_eq!(stats.total_dispatched(), 2);
        assert_eq!(stats.total_skipped_by_policy(), 1);
        assert_eq!(stats.total_denied_by_quota(), 1);
    }

    #[test]
    fn test_dispatch_resets_rate_limit_streak() {
        let stats = RunStats::new();
        assert_eq!(stats.record_rate_limit_hit(), 1);
        assert_eq!(stats.record_rate_limit_hit(), 2);

        stats.record_dispatched();
        assert_eq!(stats.consecutive_rate_limit_hits(), 0);
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let stats = RunStats::new();
        stats.record_dispatched();

        let snapshot = stats.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RunSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back.session_id, snapshot.session_id);
        assert_eq!(back.total_dispatched, 1);
    }
}
