//! Model artifact retrieval
//!
//! - `ArtifactStore`: async byte-fetch seam over the remote object store
//! - `GcsArtifactStore`: public GCS object endpoint over HTTPS
//! - `ArtifactFetcher`: download-if-absent with an atomic cache write

mod fetcher;
mod store;

pub use fetcher::ArtifactFetcher;
pub use store::{ArtifactStore, GcsArtifactStore};
