use reqwest::Url;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the persisted ranked-list file inside the cache directory
pub const DEFAULT_CACHE_FILE: &str = "recommendations.json";

/// Configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Feed endpoint serving the recommendations JSON
    pub feed_url: String,

    /// Application-private directory holding the cache file
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Cache file name
    #[serde(default = "default_cache_file_name")]
    pub cache_file_name: String,

    /// Timeout applied to feed and image requests
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("recommendations"))
        .unwrap_or_else(|| PathBuf::from(".recommendations"))
}

fn default_cache_file_name() -> String {
    DEFAULT_CACHE_FILE.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Full path of the persisted cache file
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(&self.cache_file_name)
    }

    /// Parsed feed endpoint
    pub fn feed_endpoint(&self) -> anyhow::Result<Url> {
        Url::parse(&self.feed_url)
            .map_err(|e| anyhow::anyhow!("Invalid feed_url {}: {}", self.feed_url, e))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
