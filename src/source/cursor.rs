//! Paginated cursor source
//!
//! Pulls candidate actions page-at-a-time from a remote listing until the
//! remote reports no further pages or a configured total-item cap is
//! reached. Transient fetch failures are retried with backoff up to the
//! shared retry ceiling.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::action::Action;
use crate::rate::BackoffConfig;

use super::{ActionSource, SourceError, TransportError};

/// One page of a remote listing.
pub struct Page {
    pub items: Vec<Action>,
    /// Opaque cursor for the next page; `None` means this was the last one.
    pub next_cursor: Option<String>,
}

/// Fetches pages from the remote listing.
#[async_trait]
pub trait PageFetcher: Send {
    /// `cursor` is `None` for the first page.
    async fn fetch_page(&mut self, cursor: Option<&str>) -> Result<Page, TransportError>;
}

/// Finite pull source over a paginated remote listing.
pub struct CursorSource<F> {
    fetcher: F,
    backoff: BackoffConfig,
    /// Stop after yielding this many items, regardless of remaining pages.
    max_items: Option<usize>,
    buffer: VecDeque<Action>,
    cursor: Option<String>,
    yielded: usize,
    no_more_pages: bool,
    fetch_attempts: u32,
}

impl<F: PageFetcher> CursorSource<F> {
    pub fn new(fetcher: F, backoff: BackoffConfig) -> Self {
        Self {
            fetcher,
            backoff,
            max_items: None,
            buffer: VecDeque::new(),
            cursor: None,
            yielded: 0,
            no_more_pages: false,
            fetch_attempts: 0,
        }
    }

    /// Cap the total number of items this source will yield.
    pub fn with_max_items(mut self, cap: usize) -> Self {
        self.max_items = Some(cap);
        self
    }

    async fn fetch_next_page(&mut self) -> Result<(), SourceError> {
        loop {
            match self.fetcher.fetch_page(self.cursor.as_deref()).await {
                Ok(page) => {
                    debug!(
                        items = page.items.len(),
                        has_next = page.next_cursor.is_some(),
                        "fetched page"
                    );
                    self.fetch_attempts = 0;
                    self.no_more_pages = page.next_cursor.is_none();
                    self.cursor = page.next_cursor;
                    self.buffer.extend(page.items);
                    return Ok(());
                }
                Err(err) => {
                    self.fetch_attempts += 1;
                    if !self.backoff.can_retry(self.fetch_attempts) {
                        return Err(SourceError::Terminated {
                            reason: format!(
                                "page fetch failed after {} attempts: {err}",
                                self.fetch_attempts
                            ),
                        });
                    }
                    let delay = self.backoff.delay_for(self.fetch_attempts);
                    warn!(
                        attempt = self.fetch_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "page fetch failed, backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl<F: PageFetcher> ActionSource for CursorSource<F> {
    async fn next_action(&mut self) -> Result<Option<Action>, SourceError> {
        loop {
            if let Some(cap) = self.max_items {
                if self.yielded >= cap {
                    return Ok(None);
                }
            }

            if let Some(action) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(action));
            }

            if self.no_more_pages {
                return Ok(None);
            }

            self.fetch_next_page().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TargetRef;

    fn like(id: &str) -> Action {
        Action::like(TargetRef::new(id))
    }

    fn fast_backoff(max_retries: u32) -> BackoffConfig {
        BackoffConfig {
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter_percent: 0,
            max_retries,
        }
    }

    /// Fetcher serving fixed pages, optionally failing the first N calls.
    struct ScriptedFetcher {
        pages: Vec<Page>,
        failures_before_success: u32,
        calls: u32,
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&mut self, cursor: Option<&str>) -> Result<Page, TransportError> {
            self.calls += 1;
            if self.calls <= self.failures_before_success {
                return Err(TransportError::RequestFailed("503".into()));
            }
            let index = cursor.map_or(0, |c| c.parse::<usize>().unwrap());
            let page = self.pages.remove(0);
            assert!(index < 100, "cursor sanity");
            Ok(page)
        }
    }

    fn two_pages() -> Vec<Page> {
        vec![
            Page {
                items: vec![like("a"), like("b")],
                next_cursor: Some("1".into()),
            },
            Page {
                items: vec![like("c")],
                next_cursor: None,
            },
        ]
    }

    async fn drain<F: PageFetcher>(source: &mut CursorSource<F>) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(action) = source.next_action().await.unwrap() {
            ids.push(action.target.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_iterates_all_pages() {
        let fetcher = ScriptedFetcher {
            pages: two_pages(),
            failures_before_success: 0,
            calls: 0,
        };
        let mut source = CursorSource::new(fetcher, fast_backoff(3));

        assert_eq!(drain(&mut source).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_item_cap_spans_page_boundary() {
        let fetcher = ScriptedFetcher {
            pages: two_pages(),
            failures_before_success: 0,
            calls: 0,
        };
        let mut source = CursorSource::new(fetcher, fast_backoff(3)).with_max_items(2);

        assert_eq!(drain(&mut source).await, vec!["a", "b"]);
        // Cap reached before the second page was ever requested.
        assert_eq!(source.fetcher.calls, 1);
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_retried() {
        let fetcher = ScriptedFetcher {
            pages: two_pages(),
            failures_before_success: 2,
            calls: 0,
        };
        let mut source = CursorSource::new(fetcher, fast_backoff(3));

        assert_eq!(drain(&mut source).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_persistent_fetch_failure_terminates() {
        let fetcher = ScriptedFetcher {
            pages: vec![],
            failures_before_success: 100,
            calls: 0,
        };
        let mut source = CursorSource::new(fetcher, fast_backoff(2));

        match source.next_action().await {
            Err(SourceError::Terminated { reason }) => {
                assert!(reason.contains("page fetch failed"));
            }
            other => panic!("expected Terminated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_intermediate_page_skipped() {
        let fetcher = ScriptedFetcher {
            pages: vec![
                Page {
                    items: vec![],
                    next_cursor: Some("1".into()),
                },
                Page {
                    items: vec![like("z")],
                    next_cursor: None,
                },
            ],
            failures_before_success: 0,
            calls: 0,
        };
        let mut source = CursorSource::new(fetcher, fast_backoff(3));

        assert_eq!(drain(&mut source).await, vec!["z"]);
    }
}
