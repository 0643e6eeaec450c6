//! Stream source module
//!
//! Abstracts where candidate actions come from: a live push stream that
//! reconnects on transport drops, or a paginated pull cursor with a
//! total-item cap. Both present the same lazy, pull-based sequence to the
//! scheduler loop.

mod cursor;
mod errors;
mod push;

pub use cursor::{CursorSource, Page, PageFetcher};
pub use errors::{SourceError, TransportError};
pub use push::{PushSource, StreamTransport};

use async_trait::async_trait;

use crate::action::Action;

/// A lazy sequence of candidate actions.
///
/// `Ok(None)` means the source drained normally; an error means it cannot
/// produce any further candidates (e.g. the reconnect budget ran out).
#[async_trait]
pub trait ActionSource: Send {
    async fn next_action(&mut self) -> Result<Option<Action>, SourceError>;
}

/// A pre-built finite sequence, handy for replaying fixed batches and for
/// tests.
pub struct VecSource {
    items: std::collections::VecDeque<Action>,
}

impl VecSource {
    pub fn new<I: IntoIterator<Item = Action>>(items: I) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ActionSource for VecSource {
    async fn next_action(&mut self) -> Result<Option<Action>, SourceError> {
        Ok(self.items.pop_front())
    }
}
