//! Quota tracking module
//!
//! Rolling per-kind action counters over sliding time windows, with a
//! reserve/commit/release protocol so the scheduler can back out of actions
//! that were admitted but never dispatched.

mod tracker;

pub use tracker::{QuotaTracker, QuotaWindow};
