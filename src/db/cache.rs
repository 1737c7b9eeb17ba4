use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::models::RankedList;

/// Durable local copy of the last ranked list
///
/// Read once at startup and written once per successful refresh, always from
/// the orchestrator's single refresh flow, so implementations need no locking.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Returns the persisted list, or [`CacheError::Miss`] when nothing is stored
    async fn load(&self) -> CacheResult<RankedList>;

    /// Overwrites the persisted list
    async fn save(&self, list: &RankedList) -> CacheResult<()>;
}

/// Store keeping the ranked list as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the persisted list. A missing file is not an error.
    pub async fn clear(&self) -> CacheResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Write(e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl RecommendationStore for FileStore {
    async fn load(&self) -> CacheResult<RankedList> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No cached recommendations");
                return Err(CacheError::Miss);
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cache read failed");
                return Err(CacheError::Read(e));
            }
        };

        let list: RankedList = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding corrupt cache");
            CacheError::Decode(e)
        })?;

        tracing::debug!(path = %self.path.display(), items = list.len(), "Loaded cached recommendations");
        Ok(list)
    }

    async fn save(&self, list: &RankedList) -> CacheResult<()> {
        let json = serde_json::to_vec(list).map_err(CacheError::Encode)?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(CacheError::Write)?;
        }

        // Write-then-rename so a torn write never replaces a good cache
        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(CacheError::Write)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(CacheError::Write)?;

        tracing::debug!(path = %self.path.display(), items = list.len(), "Saved recommendations cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecommendationItem, RootFeed};
    use crate::services::ranking::rank;

    fn sample_list() -> RankedList {
        let titles = vec![
            RecommendationItem {
                image_ref: "https://images.test/a.png".to_string(),
                title: "A".to_string(),
                tagline: "First".to_string(),
                rating: Some(8.0),
                is_released: true,
            },
            RecommendationItem {
                image_ref: "https://images.test/b.png".to_string(),
                title: "B".to_string(),
                tagline: "Second".to_string(),
                rating: None,
                is_released: true,
            },
        ];
        rank(&RootFeed {
            titles,
            skipped: Default::default(),
            owned_titles: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_load_missing_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("recommendations.json"));

        let result = store.load().await;
        assert!(result.unwrap_err().is_miss());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/recommendations.json"));
        let list = sample_list();

        store.save(&list).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, list);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("recommendations.json"));

        store.save(&sample_list()).await.unwrap();
        store.save(&RankedList::empty()).await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "[]");
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recommendations.json");
        std::fs::write(&path, b"{\"titles\": oops").unwrap();

        let result = FileStore::new(path).load().await;
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }

    #[tokio::test]
    async fn test_save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();
        let store = FileStore::new(blocker.join("recommendations.json"));

        let result = store.save(&sample_list()).await;
        assert!(matches!(result, Err(CacheError::Write(_))));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("recommendations.json"));

        store.clear().await.unwrap();
        store.save(&sample_list()).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.unwrap_err().is_miss());
    }
}
