//! Remote execution module
//!
//! Wraps the opaque remote client behind `RemoteActionExecutor` and maps
//! every remote outcome into the `ExecutionResult` taxonomy the scheduler
//! understands.

mod adapter;
mod errors;

pub use adapter::{ExecutionResult, ExecutorAdapter, RemoteActionExecutor};
pub use errors::RemoteError;
