use reqwest::StatusCode;

/// Errors raised while fetching the remote recommendations feed
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Feed returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Feed decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised by the local recommendations cache
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("No cached recommendations")]
    Miss,

    #[error("Cache read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("Cache decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Cache encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Cache write error: {0}")]
    Write(#[source] std::io::Error),
}

impl CacheError {
    /// True when the cache simply holds nothing yet
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss)
    }
}

/// Errors raised while acquiring a row image. These never leave the loader.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("Invalid image reference: {0}")]
    InvalidRef(String),

    #[error("Image network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image request returned status {0}")]
    Status(StatusCode),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image task failed: {0}")]
    Join(String),

    #[error("Image fetch cancelled")]
    Cancelled,
}

/// Signal handed to the presentation layer when a feed refresh fails
///
/// Every [`FetchError`] variant collapses into this single notice; the
/// original error survives only as the diagnostic `reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub reason: String,
}

impl RefreshFailure {
    /// Text suitable for the single user-visible refresh notice
    pub fn message(&self) -> &'static str {
        "Couldn't refresh recommendations. Showing the last saved list."
    }
}

impl From<&FetchError> for RefreshFailure {
    fn from(error: &FetchError) -> Self {
        Self {
            reason: error.to_string(),
        }
    }
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Refresh failed: {}", self.reason)
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
pub type CacheResult<T> = Result<T, CacheError>;
pub type ImageResult<T> = Result<T, ImageError>;
