use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::{
    error::{ImageError, ImageResult},
    models::RecommendationItem,
    services::{providers::ImageSource, sync::Completion},
};

/// Handle to a reusable display slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

/// State of one visual row as seen by the image loader
///
/// `generation` moves forward every time the row is reassigned or torn
/// down. A background result is only accepted when it was started under the
/// generation the slot still carries.
#[derive(Debug, Default)]
pub struct DisplaySlot {
    generation: u64,
    item: Option<RecommendationItem>,
    image: Option<Arc<DynamicImage>>,
    loading: bool,
    in_flight: Option<AbortHandle>,
}

impl DisplaySlot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Item currently bound to the row
    pub fn item(&self) -> Option<&RecommendationItem> {
        self.item.as_ref()
    }

    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    /// Whether the row should show its loading indicator
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.item = None;
        self.image = None;
        self.loading = false;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// Arena of display slots addressed by [`SlotId`]
#[derive(Debug, Default)]
pub struct SlotArena {
    slots: Vec<DisplaySlot>,
    free: Vec<usize>,
}

impl SlotArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a slot for a new visual row, recycling released ones first
    pub fn acquire(&mut self) -> SlotId {
        match self.free.pop() {
            Some(index) => SlotId(index),
            None => {
                self.slots.push(DisplaySlot::default());
                SlotId(self.slots.len() - 1)
            }
        }
    }

    /// Tears a row down; its token is invalidated and the slot becomes reusable
    pub fn release(&mut self, id: SlotId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.reset();
            if !self.free.contains(&id.0) {
                self.free.push(id.0);
            }
        }
    }

    /// Prepares a row for new data and returns its new generation
    ///
    /// Any image on screen is cleared and any outstanding fetch is aborted.
    pub fn reuse(&mut self, id: SlotId) -> Option<u64> {
        let slot = self.slots.get_mut(id.0)?;
        slot.reset();
        Some(slot.generation)
    }

    pub fn get(&self, id: SlotId) -> Option<&DisplaySlot> {
        self.slots.get(id.0)
    }

    fn get_mut(&mut self, id: SlotId) -> Option<&mut DisplaySlot> {
        self.slots.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Result of one background image fetch, tagged with the generation it was started under
#[derive(Debug)]
pub struct ImageCompletion {
    pub slot: SlotId,
    pub generation: u64,
    pub result: ImageResult<DynamicImage>,
}

/// Per-row asynchronous image acquisition that is safe under slot reuse
pub struct ImageSlotLoader {
    source: Arc<dyn ImageSource>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    slots: SlotArena,
    pending: usize,
}

impl ImageSlotLoader {
    pub fn new(
        source: Arc<dyn ImageSource>,
        completion_tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            source,
            completion_tx,
            slots: SlotArena::new(),
            pending: 0,
        }
    }

    pub fn slots(&self) -> &SlotArena {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotArena {
        &mut self.slots
    }

    /// Spawned fetches whose completion has not been applied yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Binds `item` to `slot` and starts loading its artwork without blocking
    ///
    /// Each call moves the slot to a new generation, so results of earlier
    /// fills are discarded even without an explicit reuse. The slot's image is
    /// cleared immediately. The fetch result comes back through the completion
    /// channel and must be handed to [`Self::apply`]. An unparseable image
    /// reference leaves the row blank.
    pub fn fill(&mut self, slot_id: SlotId, item: RecommendationItem) {
        let Some(slot) = self.slots.get_mut(slot_id) else {
            tracing::warn!(slot = ?slot_id, "Image requested for unknown slot");
            return;
        };

        slot.reset();
        let generation = slot.generation;

        let Some(url) = item.image_url() else {
            let error = ImageError::InvalidRef(item.image_ref.clone());
            slot.item = Some(item);
            settle(slot, slot_id, Err(error));
            return;
        };

        slot.item = Some(item);
        slot.loading = true;

        let source = Arc::clone(&self.source);
        let mut report = CompletionReport {
            completion_tx: self.completion_tx.clone(),
            slot: slot_id,
            generation,
            result: None,
        };
        let task = tokio::spawn(async move {
            report.result = Some(fetch_and_decode(source.as_ref(), &url).await);
        });
        slot.in_flight = Some(task.abort_handle());
        self.pending += 1;
    }

    /// Applies a finished fetch to its slot
    ///
    /// Returns `true` when the slot changed. Results started under an older
    /// generation are dropped without touching the slot.
    pub fn apply(&mut self, completion: ImageCompletion) -> bool {
        self.pending = self.pending.saturating_sub(1);

        let ImageCompletion {
            slot: slot_id,
            generation,
            result,
        } = completion;

        let Some(slot) = self.slots.get_mut(slot_id) else {
            return false;
        };

        if slot.generation != generation {
            tracing::debug!(
                slot = ?slot_id,
                started = generation,
                current = slot.generation,
                "Discarding stale image"
            );
            return false;
        }

        slot.in_flight = None;
        settle(slot, slot_id, result);
        true
    }
}

/// Puts a fetch outcome on screen; failures leave the row blank without notice
fn settle(slot: &mut DisplaySlot, slot_id: SlotId, result: ImageResult<DynamicImage>) {
    slot.loading = false;
    match result {
        Ok(image) => slot.image = Some(Arc::new(image)),
        Err(e) => {
            tracing::debug!(slot = ?slot_id, error = %e, "Image load failed");
            slot.image = None;
        }
    }
}

/// Sends the task's completion when dropped, so an aborted fetch still reports once
struct CompletionReport {
    completion_tx: mpsc::UnboundedSender<Completion>,
    slot: SlotId,
    generation: u64,
    result: Option<ImageResult<DynamicImage>>,
}

impl Drop for CompletionReport {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or(Err(ImageError::Cancelled));
        // The receiver only goes away with the orchestrator
        let _ = self.completion_tx.send(Completion::Image(ImageCompletion {
            slot: self.slot,
            generation: self.generation,
            result,
        }));
    }
}

async fn fetch_and_decode(source: &dyn ImageSource, url: &reqwest::Url) -> ImageResult<DynamicImage> {
    let bytes = source.fetch_image(url).await?;
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ImageError::Join(e.to_string()))?
        .map_err(ImageError::from)
}
