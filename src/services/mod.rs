pub mod images;
pub mod providers;
pub mod ranking;
pub mod sync;

pub use images::{DisplaySlot, ImageCompletion, ImageSlotLoader, SlotArena, SlotId};
pub use providers::{FeedFetcher, HttpFeedFetcher, HttpImageSource, ImageSource};
pub use ranking::{rank, MAX_RANKED_ITEMS};
pub use sync::{Completion, PresentationListener, SyncOrchestrator, SyncState, SyncStatus};
