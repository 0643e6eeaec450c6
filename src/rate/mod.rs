//! Rate control module
//!
//! Exponential backoff with jitter, shared by the scheduler's rate-limit
//! handling and the stream sources' reconnect logic.

mod backoff;

pub use backoff::{calculate_backoff_with_jitter, BackoffConfig};
