//! Offline-first recommendations core
//!
//! Fetches the recommendations feed, ranks it into a short display list,
//! keeps a local copy for the next launch, and loads row artwork in a way
//! that survives recycled rows.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use db::{FileStore, RecommendationStore};
pub use error::{CacheError, FetchError, ImageError, RefreshFailure};
pub use models::{RankedList, RecommendationItem, RootFeed};
pub use services::{
    rank, PresentationListener, SlotId, SyncOrchestrator, SyncState, SyncStatus,
};
