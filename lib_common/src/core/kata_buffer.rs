//! # Kata ID Buffer
//!
//! Codewars offers no "random kata" endpoint, so the service keeps a buffer
//! of candidate kata identifiers and draws from it.
//!
//! ## Policy:
//! - **Lazy refresh**: [`KataBuffer::maybe_refresh`] is called on every
//!   request and only hits the network when the buffer is empty or older than
//!   the refresh interval (one hour by default).
//! - **Two sources**: a refresh first reads one page of the listing endpoint;
//!   if that fails or comes back empty it scrapes the search page instead.
//! - **Wholesale replace**: a successful refresh replaces the identifiers and
//!   the timestamp together. Ids are never merged across refreshes.
//! - **Stale but available**: a failed refresh is logged and the current
//!   contents (and timestamp) stay exactly as they were.
//! - **Blocking fill**: [`KataBuffer::pick_random`] on an empty buffer fills
//!   it synchronously before drawing.
//!
//! ## Concurrency:
//! The identifiers and the timestamp share one `tokio::sync::Mutex`, held for
//! the whole read-modify-write of both refresh and selection, so a reader
//! never sees a half-replaced buffer. Refreshes do their network I/O while
//! holding that lock, which serializes concurrent fills: a burst of requests
//! against an empty buffer produces one upstream scan, not one per request.
//!
//! Refresh work runs on a spawned task that owns the lock guard. When the
//! request that triggered it is dropped, the refresh still completes and the
//! next request benefits from it.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::kata_scrape::{scrape_kata_ids, unique_ids};
use crate::markets::codewars::{CodewarsApi, CodewarsError};

/// How long a successful refresh stays fresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Page size requested from the listing endpoint.
pub const DEFAULT_LISTING_PAGE_SIZE: u32 = 50;

/// Why a refresh could not replace the buffer.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] CodewarsError),

    #[error("found too few katas ({found}, need at least {min}), possible parsing error")]
    ParseYieldTooLow { found: usize, min: usize },

    #[error("listing returned no kata ids")]
    EmptyListing,

    #[error("listing: {listing}; scrape: {scrape}")]
    Exhausted {
        listing: Box<RefreshError>,
        scrape: Box<RefreshError>,
    },
}

/// Why no id could be drawn.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("kata buffer is empty and could not be filled: {0}")]
    Unavailable(#[source] RefreshError),

    #[error("kata buffer fill was interrupted: {0}")]
    Interrupted(#[from] JoinError),
}

/// Tunables for [`KataBuffer`].
#[derive(Debug, Clone)]
pub struct BufferSettings {
    pub refresh_interval: Duration,
    pub listing_page_size: u32,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            listing_page_size: DEFAULT_LISTING_PAGE_SIZE,
        }
    }
}

/// Size and age of the buffer, without the identifiers themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    pub size: usize,
    /// Time since the last successful refresh, `None` if there never was one.
    pub age: Option<Duration>,
}

/// Both halves of the buffer; only ever touched under the lock.
#[derive(Debug, Default)]
struct BufferState {
    ids: Vec<String>,
    last_refreshed: Option<Instant>,
}

impl BufferState {
    fn is_due(&self, interval: Duration) -> bool {
        if self.ids.is_empty() {
            return true;
        }
        self.last_refreshed
            .map_or(true, |at| at.elapsed() >= interval)
    }

    fn replace(&mut self, ids: Vec<String>) {
        self.ids = ids;
        self.last_refreshed = Some(Instant::now());
    }

    fn choose(&self) -> Option<String> {
        self.ids.choose(&mut rand::rng()).cloned()
    }
}

/// Acquires a fresh id list from Codewars. Cheap to clone into a task.
#[derive(Clone)]
struct IdSource {
    api: Arc<dyn CodewarsApi>,
    page_size: u32,
}

impl IdSource {
    /// Listing first, scrape second. The result is non-empty and duplicate-free.
    async fn acquire(&self) -> Result<Vec<String>, RefreshError> {
        let listing = match self.from_listing().await {
            Ok(ids) => return Ok(ids),
            Err(e) => e,
        };
        warn!(error = %listing, "kata listing unavailable, falling back to search page scrape");

        match self.from_scrape().await {
            Ok(ids) => Ok(ids),
            Err(scrape) => Err(RefreshError::Exhausted {
                listing: Box::new(listing),
                scrape: Box::new(scrape),
            }),
        }
    }

    async fn from_listing(&self) -> Result<Vec<String>, RefreshError> {
        let ids = unique_ids(self.api.fetch_listing_page(0, self.page_size).await?);
        if ids.is_empty() {
            return Err(RefreshError::EmptyListing);
        }
        Ok(ids)
    }

    async fn from_scrape(&self) -> Result<Vec<String>, RefreshError> {
        let html = self.api.fetch_search_page().await?;
        scrape_kata_ids(&html)
    }

    /// Refreshes under an already held guard; failures leave the state untouched.
    async fn refresh(&self, state: &mut BufferState) -> Result<usize, RefreshError> {
        let ids = self.acquire().await?;
        let count = ids.len();
        state.replace(ids);
        Ok(count)
    }
}

/// The ID buffer manager.
///
/// Only two operations touch the identifiers: [`maybe_refresh`](Self::maybe_refresh)
/// and [`pick_random`](Self::pick_random). The raw list is never handed out.
pub struct KataBuffer {
    source: IdSource,
    state: Arc<Mutex<BufferState>>,
    refresh_interval: Duration,
}

impl KataBuffer {
    /// Creates an empty buffer. Nothing is fetched until the first call.
    pub fn new(api: Arc<dyn CodewarsApi>, settings: BufferSettings) -> Self {
        Self {
            source: IdSource {
                api,
                page_size: settings.listing_page_size,
            },
            state: Arc::new(Mutex::new(BufferState::default())),
            refresh_interval: settings.refresh_interval,
        }
    }

    /// Creates a buffer that already holds `ids`, stamped as refreshed now.
    pub fn preloaded(api: Arc<dyn CodewarsApi>, settings: BufferSettings, ids: Vec<String>) -> Self {
        let buffer = Self::new(api, settings);
        let ids = unique_ids(ids);
        if !ids.is_empty() {
            // A fresh mutex is never contended.
            if let Ok(mut state) = buffer.state.try_lock() {
                state.replace(ids);
            }
        }
        buffer
    }

    /// Creates the buffer and kicks off a warm-up refresh in the background.
    ///
    /// The warm-up is not awaited. A request that arrives before it finishes
    /// either waits on the lock behind it or, if it wins the lock first,
    /// performs its own fill; the warm-up then sees a fresh buffer and does
    /// nothing.
    pub fn start(api: Arc<dyn CodewarsApi>, settings: BufferSettings) -> Arc<Self> {
        let buffer = Arc::new(Self::new(api, settings));
        buffer.spawn_warm_up();
        buffer
    }

    /// Spawns one background [`maybe_refresh`](Self::maybe_refresh).
    pub fn spawn_warm_up(self: &Arc<Self>) -> JoinHandle<()> {
        let buffer = Arc::clone(self);
        tokio::spawn(async move { buffer.maybe_refresh().await })
    }

    /// Refreshes the buffer if it is empty or older than the refresh interval.
    ///
    /// Never fails: a failed refresh is logged and the buffer stays as it was.
    /// When nothing is due this is one lock acquisition and a timestamp check.
    pub async fn maybe_refresh(&self) {
        let mut guard = self.lock().await;
        if !guard.is_due(self.refresh_interval) {
            return;
        }

        let source = self.source.clone();
        let task = tokio::spawn(async move {
            let outcome = source.refresh(&mut guard).await;
            match outcome {
                Ok(count) => info!(count, "kata buffer refreshed"),
                Err(e) => warn!(error = %e, kept = guard.ids.len(), "failed to refresh kata buffer"),
            }
        });

        if let Err(e) = task.await {
            error!(error = %e, "kata buffer refresh task failed");
        }
    }

    /// Draws one identifier uniformly at random.
    ///
    /// An empty buffer is filled first, while holding the lock.
    ///
    /// # Errors
    /// [`BufferError::Unavailable`] when the buffer is empty and the fill fails.
    pub async fn pick_random(&self) -> Result<String, BufferError> {
        let mut guard = self.lock().await;
        if let Some(id) = guard.choose() {
            return Ok(id);
        }

        let source = self.source.clone();
        let task = tokio::spawn(async move {
            let count = source
                .refresh(&mut guard)
                .await
                .map_err(BufferError::Unavailable)?;
            info!(count, "kata buffer filled on demand");
            guard
                .choose()
                .ok_or(BufferError::Unavailable(RefreshError::EmptyListing))
        });

        task.await?
    }

    /// Current size and age.
    pub async fn stats(&self) -> BufferStats {
        let guard = self.state.lock().await;
        BufferStats {
            size: guard.ids.len(),
            age: guard.last_refreshed.map(|at| at.elapsed()),
        }
    }

    async fn lock(&self) -> OwnedMutexGuard<BufferState> {
        Arc::clone(&self.state).lock_owned().await
    }

    #[cfg(test)]
    async fn snapshot(&self) -> (Vec<String>, Option<Instant>) {
        let guard = self.state.lock().await;
        (guard.ids.clone(), guard.last_refreshed)
    }
}
