//! Cursor-paginated feed client.
//!
//! [`FeedClient`] accumulates pages of one [`FeedQuery`] in fetch order and
//! guarantees at most one outstanding request. [`SentinelWatcher`] turns
//! noisy "end of list is visible" reports into debounced `load_more` calls.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::debounce::Debouncer;
use crate::domain::Post;
use crate::error::DomainError;
use crate::pagination::Cursor;
use crate::ports::{FeedQuery, PageSource};

/// Result of a [`FeedClient::load_more`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page arrived and `added` items were appended.
    Loaded { added: usize },
    /// Another fetch is pending. The source was not contacted.
    InFlight,
    /// The last page has been seen. The source was not contacted.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    LoadingInitial,
    LoadingMore,
    Idle,
    Exhausted,
}

#[derive(Debug, Clone)]
enum NextPage {
    Start,
    After(Cursor),
    End,
}

#[derive(Debug)]
struct FeedState {
    items: Vec<Post>,
    next: NextPage,
    in_flight: bool,
    last_error: Option<String>,
}

/// Accumulating reader for one query key. Share it behind an [`Arc`]; a new
/// query key means a new client.
pub struct FeedClient {
    source: Arc<dyn PageSource>,
    query: FeedQuery,
    state: Mutex<FeedState>,
}

impl FeedClient {
    pub fn new(source: Arc<dyn PageSource>, query: FeedQuery) -> Self {
        Self {
            source,
            query,
            state: Mutex::new(FeedState {
                items: Vec::new(),
                next: NextPage::Start,
                in_flight: false,
                last_error: None,
            }),
        }
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the next page unless one is already pending or the feed is
    /// exhausted. On error the accumulated items and the cursor are kept, so
    /// the next call retries the same page.
    pub async fn load_more(&self) -> Result<LoadOutcome, DomainError> {
        let cursor = {
            let mut state = self.lock();
            if state.in_flight {
                return Ok(LoadOutcome::InFlight);
            }
            let cursor = match &state.next {
                NextPage::End => return Ok(LoadOutcome::Exhausted),
                NextPage::Start => None,
                NextPage::After(cursor) => Some(cursor.clone()),
            };
            state.in_flight = true;
            cursor
        };

        let guard = InFlight(self);
        let result = self.source.fetch_page(&self.query, cursor.as_ref()).await;

        // The flag clears under the same lock that commits the page, so no
        // caller can see the old cursor with nothing in flight.
        let mut state = self.lock();
        state.in_flight = false;
        mem::forget(guard);
        match result {
            Ok(page) => {
                let added = page.data.len();
                state.items.extend(page.data);
                state.next = match page.after {
                    Some(cursor) => NextPage::After(cursor),
                    None => NextPage::End,
                };
                state.last_error = None;
                tracing::debug!(
                    scope = ?self.query.scope,
                    added,
                    total = state.items.len(),
                    "Feed page loaded"
                );
                Ok(LoadOutcome::Loaded { added })
            }
            Err(e) => {
                tracing::warn!(scope = ?self.query.scope, cursor = ?cursor, error = %e, "Feed page failed");
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Snapshot of the accumulated items.
    pub fn items(&self) -> Vec<Post> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn status(&self) -> FeedStatus {
        let state = self.lock();
        match (&state.next, state.in_flight) {
            (NextPage::Start, true) if state.items.is_empty() => FeedStatus::LoadingInitial,
            (_, true) => FeedStatus::LoadingMore,
            (NextPage::End, false) => FeedStatus::Exhausted,
            _ => FeedStatus::Idle,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.lock().next, NextPage::End)
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }
}

/// Clears the in-flight flag when `load_more` is dropped mid-fetch.
struct InFlight<'a>(&'a FeedClient);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().in_flight = false;
    }
}

/// Debounced trigger for "load more" driven by sentinel visibility.
///
/// Dropping the watcher stops it. A load it already started runs to
/// completion.
pub struct SentinelWatcher {
    visible: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl SentinelWatcher {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    pub fn spawn(feed: Arc<FeedClient>, delay: Duration) -> Self {
        let (visible, reports) = watch::channel(false);
        let worker = tokio::spawn(watch_sentinel(feed, reports, Debouncer::new(delay)));
        Self { visible, worker }
    }

    /// Report whether the end-of-list sentinel is currently in view.
    pub fn report(&self, visible: bool) {
        self.visible.send_replace(visible);
    }
}

impl Drop for SentinelWatcher {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn watch_sentinel(
    feed: Arc<FeedClient>,
    mut reports: watch::Receiver<bool>,
    mut debouncer: Debouncer<bool>,
) {
    loop {
        tokio::select! {
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let visible = *reports.borrow_and_update();
                debouncer.push(visible);
            }
            visible = debouncer.settled() => {
                if !visible {
                    continue;
                }
                let feed = feed.clone();
                // Errors are recorded and logged by the feed itself.
                tokio::spawn(async move {
                    if let Ok(outcome) = feed.load_more().await {
                        tracing::trace!(?outcome, "Sentinel load finished");
                    }
                });
            }
        }
    }
}
