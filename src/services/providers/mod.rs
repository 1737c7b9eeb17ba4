//! Remote sources for the recommendations core
//!
//! The feed and the row artwork each come from a pluggable source so the sync
//! engine can run against HTTP in production and against doubles in tests.

use reqwest::Url;

use crate::{
    error::{FetchResult, ImageResult},
    models::RootFeed,
};

pub mod http;

pub use http::{HttpFeedFetcher, HttpImageSource};

/// Retrieves and decodes the recommendations feed
///
/// Exactly one request per call. Implementations never retry; the caller owns
/// the retry policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the feed at `endpoint` and decode it into a [`RootFeed`]
    async fn fetch(&self, endpoint: &Url) -> FetchResult<RootFeed>;
}

/// Retrieves the raw bytes of a row image
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, url: &Url) -> ImageResult<Vec<u8>>;
}
