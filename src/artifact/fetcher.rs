//! Download-if-absent artifact caching

use std::path::{Path, PathBuf};

use tracing::info;

use super::ArtifactStore;
use crate::config::Settings;
use crate::error::{Result, SpotterError};

/// Materializes the model artifact at a local cache path.
///
/// Presence of the cache file is the fetch-completion signal: a cached
/// artifact is reused without contacting the store. The file is written to a
/// `.part` sibling and renamed into place so a crashed download never leaves
/// a half-written artifact at the final path.
#[derive(Debug)]
pub struct ArtifactFetcher<S> {
    store: S,
    bucket: String,
    blob: String,
    cache_path: PathBuf,
}

impl<S: ArtifactStore> ArtifactFetcher<S> {
    pub fn new(store: S, settings: &Settings) -> Self {
        Self {
            store,
            bucket: settings.model_bucket.clone(),
            blob: settings.model_blob.clone(),
            cache_path: settings.cache_path.clone(),
        }
    }

    /// Local path the artifact lands at.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Ensure the artifact exists locally, downloading it when absent.
    /// Returns the cache path on success.
    pub async fn ensure_local(&self) -> Result<PathBuf> {
        if self.bucket.is_empty() || self.blob.is_empty() {
            return Err(SpotterError::Config(
                "MODEL_BUCKET and MODEL_BLOB (or MODEL_URI) must be set".to_string(),
            ));
        }

        if self.cache_path.exists() {
            info!(path = %self.cache_path.display(), "model artifact already cached, skipping download");
            return Ok(self.cache_path.clone());
        }

        let bytes = self.store.fetch(&self.bucket, &self.blob).await?;

        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let part_path = {
            let mut p = self.cache_path.clone().into_os_string();
            p.push(".part");
            PathBuf::from(p)
        };
        tokio::fs::write(&part_path, &bytes).await?;
        tokio::fs::rename(&part_path, &self.cache_path).await?;

        info!(
            path = %self.cache_path.display(),
            bytes = bytes.len(),
            "model artifact cached"
        );
        Ok(self.cache_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct StaticStore {
        bytes: Vec<u8>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticStore {
        fn new(bytes: &[u8]) -> Self {
            Self {
                bytes: bytes.to_vec(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ArtifactStore for StaticStore {
        async fn fetch(&self, _bucket: &str, _blob: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bytes.clone())
        }
    }

    struct FailingStore;

    impl ArtifactStore for FailingStore {
        async fn fetch(&self, _bucket: &str, _blob: &str) -> Result<Vec<u8>> {
            Err(SpotterError::Fetch("connection refused".to_string()))
        }
    }

    fn settings(dir: &Path) -> Settings {
        Settings::from_env()
            .with_bucket("models")
            .with_blob("v1/weights.bin")
            .with_cache_path(dir.join("cache").join("model.bin"))
    }

    #[tokio::test]
    async fn test_download_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = StaticStore::new(b"weights");
        let calls = store.calls.clone();

        let fetcher = ArtifactFetcher::new(store, &settings(dir.path()));
        let path = fetcher.ensure_local().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"weights");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_artifact_skips_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        std::fs::create_dir_all(settings.cache_path.parent().unwrap()).unwrap();
        std::fs::write(&settings.cache_path, b"already here").unwrap();

        let store = StaticStore::new(b"fresh bytes");
        let calls = store.calls.clone();

        let fetcher = ArtifactFetcher::new(store, &settings);
        let path = fetcher.ensure_local().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"already here");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_call_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = StaticStore::new(b"weights");
        let calls = store.calls.clone();

        let fetcher = ArtifactFetcher::new(store, &settings(dir.path()));
        fetcher.ensure_local().await.unwrap();
        fetcher.ensure_local().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_location_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ArtifactFetcher::new(
            StaticStore::new(b"x"),
            &settings(dir.path()).with_bucket(""),
        );
        let err = fetcher.ensure_local().await.unwrap_err();
        assert!(matches!(err, SpotterError::Config(_)));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let fetcher = ArtifactFetcher::new(FailingStore, &settings);

        let err = fetcher.ensure_local().await.unwrap_err();
        assert!(matches!(err, SpotterError::Fetch(_)));
        assert!(!settings.cache_path.exists());
    }
}
