//! Statistics module
//!
//! Lock-free session counters using atomic operations.

mod run;

pub use run::{RunSnapshot, RunStats};
