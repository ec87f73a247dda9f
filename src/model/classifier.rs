//! Dense classification head and its serialized artifact format

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpotterError};

/// Number of output classes.
pub const NUM_CLASSES: usize = 10;
/// Input channels (RGB).
pub const INPUT_CHANNELS: usize = 3;
/// Input height in pixels.
pub const INPUT_HEIGHT: usize = 32;
/// Input width in pixels.
pub const INPUT_WIDTH: usize = 32;
/// Hidden dimensions of the classification head.
pub const HIDDEN_DIMS: [usize; 3] = [64, 80, 96];
/// Backbone channel progression recorded in the artifact descriptor.
pub const BACKBONE_CHANNELS: [usize; 11] = [16, 16, 24, 24, 48, 48, 64, 64, 80, 80, 320];
/// MV2 block expansion factor recorded in the artifact descriptor.
pub const EXPANSION_FACTOR: usize = 2;
/// Attention patch size recorded in the artifact descriptor.
pub const PATCH_SIZE: usize = 1;

/// Serialization format version. Bumped on any layout change.
const FORMAT_VERSION: u32 = 1;

/// Flattened input length fed to the first dense stage.
const INPUT_FLAT: usize = INPUT_CHANNELS * INPUT_HEIGHT * INPUT_WIDTH;

/// Architecture fingerprint stored alongside the weights.
///
/// Loading validates every field against the compile-time constants above, so
/// an artifact exported for a different architecture fails fast instead of
/// producing silently wrong scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchDescriptor {
    /// Number of output classes.
    pub num_classes: usize,
    /// Input shape as (channels, height, width).
    pub input_shape: (usize, usize, usize),
    /// Hidden dimensions of the head.
    pub hidden_dims: Vec<usize>,
    /// Backbone channel progression.
    pub channels: Vec<usize>,
    /// MV2 expansion factor.
    pub expansion_factor: usize,
    /// Attention patch size.
    pub patch_size: usize,
}

impl Default for ArchDescriptor {
    fn default() -> Self {
        Self {
            num_classes: NUM_CLASSES,
            input_shape: (INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH),
            hidden_dims: HIDDEN_DIMS.to_vec(),
            channels: BACKBONE_CHANNELS.to_vec(),
            expansion_factor: EXPANSION_FACTOR,
            patch_size: PATCH_SIZE,
        }
    }
}

impl ArchDescriptor {
    /// Check the descriptor against the architecture this binary was built
    /// for.
    pub fn validate(&self) -> Result<()> {
        let expected = Self::default();
        if self != &expected {
            return Err(SpotterError::Load(format!(
                "architecture mismatch: artifact declares {:?}, serving binary expects {:?}",
                self, expected
            )));
        }
        Ok(())
    }
}

/// Weights of one dense stage, stored row-major as `out_features` rows of
/// `in_features` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseWeights {
    /// Input width of this stage.
    pub in_features: usize,
    /// Output width of this stage.
    pub out_features: usize,
    /// Row-major weight matrix, `out_features * in_features` values.
    pub weight: Vec<f32>,
    /// Bias vector, `out_features` values.
    pub bias: Vec<f32>,
}

impl DenseWeights {
    /// All-zero weights of the given shape. Useful for smoke artifacts.
    pub fn zeros(in_features: usize, out_features: usize) -> Self {
        Self {
            in_features,
            out_features,
            weight: vec![0.0; in_features * out_features],
            bias: vec![0.0; out_features],
        }
    }

    fn to_arrays(&self) -> Result<(Array2<f32>, Array1<f32>)> {
        if self.bias.len() != self.out_features {
            return Err(SpotterError::Load(format!(
                "bias length {} does not match out_features {}",
                self.bias.len(),
                self.out_features
            )));
        }
        let weight =
            Array2::from_shape_vec((self.out_features, self.in_features), self.weight.clone())
                .map_err(|e| {
                    SpotterError::Load(format!(
                        "weight matrix shape ({}, {}) invalid: {}",
                        self.out_features, self.in_features, e
                    ))
                })?;
        Ok((weight, Array1::from_vec(self.bias.clone())))
    }
}

/// The on-disk model artifact: format version, architecture fingerprint, and
/// the dense stage weights in forward order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Serialization format version.
    pub format_version: u32,
    /// Architecture the weights were exported for.
    pub arch: ArchDescriptor,
    /// Dense stages, input side first.
    pub layers: Vec<DenseWeights>,
}

impl ModelArtifact {
    /// Wrap stage weights with the current format version and architecture
    /// descriptor.
    pub fn from_layers(layers: Vec<DenseWeights>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            arch: ArchDescriptor::default(),
            layers,
        }
    }

    /// Serialize to the binary wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SpotterError::Load(format!("failed to serialize artifact: {}", e)))
    }

    /// Deserialize from the binary wire format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| SpotterError::Load(format!("failed to deserialize artifact: {}", e)))
    }
}

/// Dense stage chain from flattened input to class logits, with SiLU
/// activations between stages.
#[derive(Debug)]
pub struct ImageClassifier {
    stages: Vec<(Array2<f32>, Array1<f32>)>,
    eval_mode: bool,
}

impl ImageClassifier {
    /// Build a classifier from a deserialized artifact. Validates the
    /// architecture descriptor, the format version, and the stage dimension
    /// chain before touching any weights.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(SpotterError::Load(format!(
                "unsupported artifact format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }
        artifact.arch.validate()?;

        let expected_dims = stage_dims();
        if artifact.layers.len() != expected_dims.len() - 1 {
            return Err(SpotterError::Load(format!(
                "expected {} dense stages, artifact has {}",
                expected_dims.len() - 1,
                artifact.layers.len()
            )));
        }

        let mut stages = Vec::with_capacity(artifact.layers.len());
        for (i, layer) in artifact.layers.iter().enumerate() {
            let (expect_in, expect_out) = (expected_dims[i], expected_dims[i + 1]);
            if layer.in_features != expect_in || layer.out_features != expect_out {
                return Err(SpotterError::Load(format!(
                    "stage {} has shape {}x{}, expected {}x{}",
                    i, layer.out_features, layer.in_features, expect_out, expect_in
                )));
            }
            stages.push(layer.to_arrays()?);
        }

        Ok(Self {
            stages,
            eval_mode: false,
        })
    }

    /// Switch to evaluation mode. One-way: serving never trains.
    pub fn eval(&mut self) {
        self.eval_mode = true;
    }

    /// Whether the classifier is in evaluation mode.
    pub fn is_eval(&self) -> bool {
        self.eval_mode
    }
}

impl super::Classifier for ImageClassifier {
    fn class_scores(&self, input: &Array3<f32>) -> Result<Array1<f32>> {
        if !self.eval_mode {
            return Err(SpotterError::Inference(
                "classifier is not in evaluation mode".to_string(),
            ));
        }
        let shape = input.dim();
        if shape != (INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH) {
            return Err(SpotterError::Inference(format!(
                "input shape {:?} does not match expected ({}, {}, {})",
                shape, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH
            )));
        }

        // Flatten channels-first, then run the stage chain.
        let mut x = Array1::from_iter(input.iter().copied());
        let last = self.stages.len() - 1;
        for (i, (weight, bias)) in self.stages.iter().enumerate() {
            x = weight.dot(&x) + bias;
            if i < last {
                x.mapv_inplace(silu);
            }
        }
        Ok(x)
    }

    fn num_classes(&self) -> usize {
        NUM_CLASSES
    }
}

/// Stage widths from flattened input through the hidden dims to the logits.
fn stage_dims() -> Vec<usize> {
    let mut dims = Vec::with_capacity(HIDDEN_DIMS.len() + 2);
    dims.push(INPUT_FLAT);
    dims.extend_from_slice(&HIDDEN_DIMS);
    dims.push(NUM_CLASSES);
    dims
}

/// SiLU activation: x * sigmoid(x).
fn silu(x: f32) -> f32 {
    x / (1.0 + (-x).exp())
}

/// Softmax over raw scores, shifted by the max score for numerical
/// stability.
pub fn softmax(scores: &Array1<f32>) -> Array1<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = scores.mapv(|s| (s - max).exp());
    let sum = exp.sum();
    exp / sum
}
