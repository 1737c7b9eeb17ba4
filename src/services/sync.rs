use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, Url};
use tokio::sync::mpsc;

use crate::{
    config::Config,
    db::{FileStore, RecommendationStore},
    error::{CacheError, FetchResult, RefreshFailure},
    models::{RankedList, RecommendationItem, RootFeed},
    services::{
        images::{DisplaySlot, ImageCompletion, ImageSlotLoader, SlotId},
        providers::{FeedFetcher, HttpFeedFetcher, HttpImageSource, ImageSource},
        ranking::rank,
    },
};

/// Refresh lifecycle of the orchestrator
///
/// `Refreshed` and `RefreshFailed` are the resting states after a refresh and
/// take the place of `Idle` from then on: `start()` is only honored once, from
/// `Idle`, and further refreshes go through `retry()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Reading the local cache
    Loading,
    /// A feed fetch is in flight
    Refreshing,
    Refreshed,
    RefreshFailed,
}

impl SyncState {
    /// Terminal outcomes from which a retry is honored
    pub fn is_settled(&self) -> bool {
        matches!(self, SyncState::Refreshed | SyncState::RefreshFailed)
    }
}

/// Snapshot of the orchestrator for status displays
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub item_count: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Result of background work, handed back to the presentation domain
#[derive(Debug)]
pub enum Completion {
    Feed(FetchResult<RootFeed>),
    Image(ImageCompletion),
}

/// Receives list and refresh notifications on the presentation domain
#[cfg_attr(test, mockall::automock)]
pub trait PresentationListener: Send + Sync {
    fn on_list_changed(&self, list: Arc<RankedList>);

    fn on_refresh_failed(&self, failure: &RefreshFailure);

    /// A row's image or loading indicator changed
    fn on_slot_image_changed(&self, _slot: SlotId) {}
}

/// Coordinates cache, feed and ranking; owns the authoritative ranked list
///
/// Whoever holds `&mut SyncOrchestrator` is the presentation domain. Fetches
/// run on spawned tasks and report through the completion channel; nothing is
/// applied until [`SyncOrchestrator::pump`] or [`SyncOrchestrator::try_pump`]
/// hands the result back. The list is replaced wholesale, so an `Arc` obtained
/// from [`SyncOrchestrator::current`] never changes under its reader.
pub struct SyncOrchestrator {
    store: Arc<dyn RecommendationStore>,
    fetcher: Arc<dyn FeedFetcher>,
    endpoint: Url,
    listener: Arc<dyn PresentationListener>,
    images: ImageSlotLoader,
    state: SyncState,
    current: Arc<RankedList>,
    last_refreshed_at: Option<DateTime<Utc>>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn RecommendationStore>,
        fetcher: Arc<dyn FeedFetcher>,
        image_source: Arc<dyn ImageSource>,
        listener: Arc<dyn PresentationListener>,
        endpoint: Url,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let images = ImageSlotLoader::new(image_source, completion_tx.clone());

        Self {
            store,
            fetcher,
            endpoint,
            listener,
            images,
            state: SyncState::Idle,
            current: Arc::new(RankedList::empty()),
            last_refreshed_at: None,
            completion_tx,
            completion_rx,
        }
    }

    /// Wires the file cache and HTTP sources described by `config`
    pub fn from_config(
        config: &Config,
        listener: Arc<dyn PresentationListener>,
    ) -> anyhow::Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self::new(
            Arc::new(FileStore::from_config(config)),
            Arc::new(HttpFeedFetcher::with_client(http_client.clone())),
            Arc::new(HttpImageSource::with_client(http_client)),
            listener,
            config.feed_endpoint()?,
        ))
    }

    /// Publishes the cached list, if any, and starts the one feed fetch
    ///
    /// Only honored from `Idle`; later calls are no-ops. Use [`Self::retry`]
    /// once a refresh has settled.
    pub async fn start(&mut self) {
        if self.state != SyncState::Idle {
            tracing::debug!(state = ?self.state, "Start ignored");
            return;
        }

        self.state = SyncState::Loading;
        match self.store.load().await {
            Ok(cached) => {
                tracing::info!(items = cached.len(), "Showing cached recommendations");
                self.publish(cached);
            }
            Err(CacheError::Miss) => {
                tracing::debug!("Cache empty, waiting for feed");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Cache unusable, treating as empty");
            }
        }

        self.begin_refresh();
    }

    /// Starts another feed fetch after the previous one settled
    ///
    /// Returns `false` (and does nothing) unless the state is `Refreshed` or
    /// `RefreshFailed`.
    pub fn retry(&mut self) -> bool {
        if !self.state.is_settled() {
            tracing::debug!(state = ?self.state, "Retry ignored");
            return false;
        }

        self.begin_refresh();
        true
    }

    fn begin_refresh(&mut self) {
        self.state = SyncState::Refreshing;
        tracing::info!(endpoint = %self.endpoint, "Refreshing recommendations");

        let fetcher = Arc::clone(&self.fetcher);
        let endpoint = self.endpoint.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&endpoint).await;
            let _ = completion_tx.send(Completion::Feed(result));
        });
    }

    /// Waits for the next background result and applies it
    ///
    /// Returns `false` immediately when no feed or image fetch is outstanding.
    pub async fn pump(&mut self) -> bool {
        if !self.has_pending_work() {
            return false;
        }

        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply(completion).await;
                true
            }
            None => false,
        }
    }

    /// Whether a feed fetch or an image fetch still has to report back
    pub fn has_pending_work(&self) -> bool {
        self.state == SyncState::Refreshing || self.images.pending() > 0
    }

    /// Applies one background result if one is already waiting
    pub async fn try_pump(&mut self) -> bool {
        match self.completion_rx.try_recv() {
            Ok(completion) => {
                self.apply(completion).await;
                true
            }
            Err(_) => false,
        }
    }

    async fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Feed(result) => self.finish_refresh(result).await,
            Completion::Image(completion) => {
                let slot = completion.slot;
                if self.images.apply(completion) {
                    self.listener.on_slot_image_changed(slot);
                }
            }
        }
    }

    async fn finish_refresh(&mut self, result: FetchResult<RootFeed>) {
        if self.state != SyncState::Refreshing {
            tracing::warn!(state = ?self.state, "Unexpected feed result ignored");
            return;
        }

        match result {
            Ok(root) => {
                let ranked = rank(&root);
                self.current = Arc::new(ranked);

                if let Err(e) = self.store.save(&self.current).await {
                    tracing::warn!(error = %e, "Failed to persist recommendations");
                }

                self.state = SyncState::Refreshed;
                self.last_refreshed_at = Some(Utc::now());
                tracing::info!(
                    candidates = root.titles.len(),
                    items = self.current.len(),
                    "Recommendations refreshed"
                );
                self.listener.on_list_changed(Arc::clone(&self.current));
            }
            Err(e) => {
                tracing::error!(error = %e, "Recommendations refresh failed");
                self.state = SyncState::RefreshFailed;
                self.listener.on_refresh_failed(&RefreshFailure::from(&e));
            }
        }
    }

    fn publish(&mut self, list: RankedList) {
        self.current = Arc::new(list);
        self.listener.on_list_changed(Arc::clone(&self.current));
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            state: self.state,
            item_count: self.current.len(),
            last_refreshed_at: self.last_refreshed_at,
        }
    }

    /// Current ranked list snapshot
    pub fn current(&self) -> Arc<RankedList> {
        Arc::clone(&self.current)
    }

    pub fn item_count(&self) -> usize {
        self.current.len()
    }

    pub fn item(&self, index: usize) -> Option<&RecommendationItem> {
        self.current.get(index)
    }

    /// Allocates a display slot for a new visual row
    pub fn acquire_slot(&mut self) -> SlotId {
        self.images.slots_mut().acquire()
    }

    /// Invalidates a row's slot on teardown
    pub fn release_slot(&mut self, slot: SlotId) {
        self.images.slots_mut().release(slot);
    }

    pub fn slot(&self, slot: SlotId) -> Option<&DisplaySlot> {
        self.images.slots().get(slot)
    }

    /// Binds `slot` to the item at `index` and starts loading its image
    ///
    /// Every call counts as a reuse of the row: the previous image is cleared
    /// and any result still in flight for the slot will be discarded. An index
    /// past the end of the list leaves the row blank.
    pub fn request_image(&mut self, slot: SlotId, index: usize) {
        match self.current.get(index).cloned() {
            Some(item) => self.images.fill(slot, item),
            None => match self.images.slots_mut().reuse(slot) {
                Some(_) => tracing::debug!(slot = ?slot, index, "No item at index"),
                None => tracing::warn!(slot = ?slot, "Image requested for unknown slot"),
            },
        }
    }
}
