//! Image classification model
//!
//! - `Classifier` trait: the inference seam the HTTP layer depends on
//! - `ImageClassifier`: dense classification head over flattened RGB input
//! - `ModelArtifact`: serialized weight format with architecture descriptor
//! - `WeightsLoader`: deserialize, validate, and build a ready classifier

mod classifier;
mod labels;
mod loader;

pub use classifier::{
    softmax, ArchDescriptor, DenseWeights, ImageClassifier, ModelArtifact, BACKBONE_CHANNELS,
    EXPANSION_FACTOR, HIDDEN_DIMS, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, NUM_CLASSES,
    PATCH_SIZE,
};
pub use labels::{class_name, CLASS_NAMES};
pub use loader::{load_classifier, ClassifierLoader, WeightsLoader};

use crate::error::Result;
use ndarray::{Array1, Array3};

/// Inference interface the serving layer depends on.
///
/// Implementations must be immutable after construction so a single instance
/// can be shared across request handlers without locking.
pub trait Classifier: Send + Sync {
    /// Raw class scores (logits) for one preprocessed input tensor.
    fn class_scores(&self, input: &Array3<f32>) -> Result<Array1<f32>>;

    /// Number of output classes.
    fn num_classes(&self) -> usize;
}
