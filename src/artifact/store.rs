//! Remote artifact store access

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::error::{Result, SpotterError};

/// Download timeout covering the whole artifact transfer.
const FETCH_TIMEOUT_SECS: u64 = 300;

/// Async byte-fetch seam over the remote object store. Kept as a trait so
/// the startup machinery can be driven by in-memory stores in tests.
pub trait ArtifactStore: Send + Sync + 'static {
    /// Fetch the full contents of `blob` from `bucket`.
    fn fetch(&self, bucket: &str, blob: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Fetches objects through the public GCS HTTPS endpoint,
/// `https://storage.googleapis.com/{bucket}/{blob}`. The base URL is
/// overridable so tests can point it at a local server.
#[derive(Debug, Clone)]
pub struct GcsArtifactStore {
    client: reqwest::Client,
    base_url: String,
}

impl GcsArtifactStore {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| SpotterError::Fetch(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: "https://storage.googleapis.com".to_string(),
        })
    }

    /// Override the object endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn object_url(&self, bucket: &str, blob: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), bucket, blob)
    }
}

impl ArtifactStore for GcsArtifactStore {
    async fn fetch(&self, bucket: &str, blob: &str) -> Result<Vec<u8>> {
        let url = self.object_url(bucket, blob);
        info!(url = %url, "downloading model artifact");

        let response = self
            .client
            .get(&url)
            .header(
                "User-Agent",
                concat!("spotter/", env!("CARGO_PKG_VERSION")),
            )
            .send()
            .await
            .map_err(|e| SpotterError::Fetch(format!("download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SpotterError::Fetch(format!(
                "HTTP {} fetching {}",
                response.status().as_u16(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpotterError::Fetch(format!("failed to read response body: {}", e)))?;

        if bytes.is_empty() {
            return Err(SpotterError::Fetch(format!("empty response body from {}", url)));
        }
        Ok(bytes.to_vec())
    }
}
