use std::time::Duration;

use reqwest::{Client as HttpClient, Url};

use crate::{
    error::{FetchError, FetchResult, ImageError, ImageResult},
    models::RootFeed,
    services::providers::{FeedFetcher, ImageSource},
};

/// Feed fetcher backed by reqwest
#[derive(Clone)]
pub struct HttpFeedFetcher {
    http_client: HttpClient,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http_client))
    }

    /// Reuse an existing client (shares its connection pool)
    pub fn with_client(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, endpoint: &Url) -> FetchResult<RootFeed> {
        let response = self.http_client.get(endpoint.clone()).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let root: RootFeed = serde_json::from_slice(&bytes)?;

        tracing::info!(
            endpoint = %endpoint,
            titles = root.titles.len(),
            skipped = root.skipped.len(),
            owned = root.owned_titles.len(),
            "Feed fetched"
        );

        Ok(root)
    }
}

/// Image source backed by reqwest
#[derive(Clone)]
pub struct HttpImageSource {
    http_client: HttpClient,
}

impl HttpImageSource {
    pub fn new(timeout: Duration) -> ImageResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait::async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_image(&self, url: &Url) -> ImageResult<Vec<u8>> {
        let response = self.http_client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
