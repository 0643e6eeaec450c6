//! Policy filtering module
//!
//! Evaluates candidate actions against configured target bounds before any
//! quota or remote call is attempted.

mod filter;

pub use filter::Policy;
