//! Scheduling module
//!
//! The dispatch loop tying everything together: pulls candidates from a
//! stream source, filters them against policy, reserves quota, executes
//! remotely, and backs off on rate limits.

mod cancel;
mod runner;

pub use cancel::CancelToken;
pub use runner::{spawn_session, Scheduler, SessionSummary, StopReason};
