//! Action data model
//!
//! Candidate actions flowing from a stream source to the scheduler.

mod types;

pub use types::{Action, ActionKind, TargetRef};
