//! Artifact loading and validation

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{Classifier, ImageClassifier, ModelArtifact};
use crate::error::{Result, SpotterError};

/// Builds a ready classifier from an artifact file on disk.
///
/// Kept as a trait so the readiness machinery can be driven by stub loaders
/// in tests. Loading is CPU and disk bound, callers run it on a blocking
/// thread.
pub trait ClassifierLoader: Send + Sync + 'static {
    /// Read, validate, and construct a classifier in evaluation mode.
    fn load(&self, path: &Path) -> Result<Arc<dyn Classifier>>;
}

/// Production loader for the binary weight format.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightsLoader;

impl ClassifierLoader for WeightsLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn Classifier>> {
        load_classifier(path)
    }
}

/// Deserialize the artifact at `path` and return a classifier switched to
/// evaluation mode.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>> {
    if !path.exists() {
        return Err(SpotterError::ArtifactMissing {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path)?;
    let artifact = ModelArtifact::from_bytes(&bytes)?;
    let mut classifier = ImageClassifier::from_artifact(&artifact)?;
    classifier.eval();

    info!(
        path = %path.display(),
        bytes = bytes.len(),
        stages = artifact.layers.len(),
        "model weights loaded"
    );
    Ok(Arc::new(classifier))
}
