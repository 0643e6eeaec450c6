//! Sliding-window quota tracker
//!
//! Tracks committed execution timestamps per action kind over one or more
//! rolling windows (e.g. 21 comments hourly and 240 daily at the same time).
//! An action is admitted only when every window configured for its kind has
//! remaining capacity.
//!
//! Admission is a two-phase protocol: `try_reserve` claims a pending slot
//! without recording a timestamp, and the caller either `commit`s it after a
//! successful dispatch or `release`s it when the action never went out.
//! Pending slots count against the limits, which prevents over-admission
//! when several scheduler loops share one tracker.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::action::ActionKind;

/// One rolling window limit for an action kind.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaWindow {
    pub kind: ActionKind,
    /// Window length in seconds.
    pub period_secs: u64,
    /// Maximum committed actions of `kind` within any sliding window.
    pub limit: u32,
}

impl QuotaWindow {
    pub fn new(kind: ActionKind, period_secs: u64, limit: u32) -> Self {
        Self {
            kind,
            period_secs,
            limit,
        }
    }

    /// Convenience: per-hour window.
    pub fn hourly(kind: ActionKind, limit: u32) -> Self {
        Self::new(kind, 3600, limit)
    }

    /// Convenience: per-day window.
    pub fn daily(kind: ActionKind, limit: u32) -> Self {
        Self::new(kind, 86_400, limit)
    }
}

/// Committed timestamps for a single window.
#[derive(Debug)]
struct WindowState {
    period: Duration,
    limit: u32,
    timestamps: VecDeque<Instant>,
}

impl WindowState {
    fn new(period: Duration, limit: u32) -> Self {
        Self {
            period,
            limit,
            timestamps: VecDeque::with_capacity(limit as usize),
        }
    }

    /// Drop timestamps that have aged out of the window.
    fn purge(&mut self, now: Instant) {
        while let Some(front) = self.timestamps.front() {
            if now.duration_since(*front) >= self.period {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_capacity(&self, pending: u32) -> bool {
        (self.timestamps.len() as u32).saturating_add(pending) < self.limit
    }
}

/// All quota state for one action kind: its windows plus in-flight
/// reservations that have not been committed or released yet.
#[derive(Debug)]
struct KindQuota {
    pending: u32,
    windows: Vec<WindowState>,
}

/// Rolling quota counters shared by all scheduler loops of a session.
///
/// Per-kind state sits behind its own mutex inside a concurrent map, so
/// admission for distinct kinds never contends while checks and mutations
/// for a single kind are serialized.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    kinds: DashMap<ActionKind, Mutex<KindQuota>>,
}

impl QuotaTracker {
    /// Build a tracker from window definitions. A kind that appears in no
    /// window is unbounded: always admitted, nothing recorded.
    pub fn new<I>(windows: I) -> Self
    where
        I: IntoIterator<Item = QuotaWindow>,
    {
        let tracker = Self {
            kinds: DashMap::new(),
        };

        for window in windows {
            let entry = tracker
                .kinds
                .entry(window.kind)
                .or_insert_with(|| Mutex::new(KindQuota {
                    pending: 0,
                    windows: Vec::new(),
                }));
            entry.lock().windows.push(WindowState::new(
                Duration::from_secs(window.period_secs),
                window.limit,
            ));
        }

        tracker
    }

    /// Claim a pending slot for `kind` if every configured window has
    /// capacity. Records no timestamp; pair with `commit` or `release`.
    pub fn try_reserve(&self, kind: ActionKind, now: Instant) -> bool {
        let Some(entry) = self.kinds.get(&kind) else {
            return true;
        };
        let mut state = entry.lock();
        let pending = state.pending;

        for window in &mut state.windows {
            window.purge(now);
        }

        let admitted = state.windows.iter().all(|w| w.has_capacity(pending));
        if admitted {
            state.pending += 1;
        } else {
            debug!(kind = %kind, pending, "quota denied");
        }
        admitted
    }

    /// Confirm a reservation: record `now` in every window for `kind`.
    pub fn commit(&self, kind: ActionKind, now: Instant) {
        let Some(entry) = self.kinds.get(&kind) else {
            return;
        };
        let mut state = entry.lock();
        state.pending = state.pending.saturating_sub(1);
        for window in &mut state.windows {
            window.purge(now);
            window.timestamps.push_back(now);
        }
    }

    /// Undo a reservation that never executed. Committed state is untouched.
    pub fn release(&self, kind: ActionKind, now: Instant) {
        let Some(entry) = self.kinds.get(&kind) else {
            return;
        };
        let mut state = entry.lock();
        state.pending = state.pending.saturating_sub(1);
        for window in &mut state.windows {
            window.purge(now);
        }
    }

    /// Committed count for `kind` in its most constrained window, for
    /// logging and tests. Zero for unbounded kinds.
    pub fn committed(&self, kind: ActionKind, now: Instant) -> u32 {
        let Some(entry) = self.kinds.get(&kind) else {
            return 0;
        };
        let mut state = entry.lock();
        state
            .windows
            .iter_mut()
            .map(|w| {
                w.purge(now);
                w.timestamps.len() as u32
            })
            .max()
            .unwrap_or(0)
    }
}
