//! Image preprocessing pipeline
//!
//! Decodes an uploaded image, resizes it to the model input resolution, and
//! converts it to a channels-first tensor normalized to `[-1, 1]`.

use image::imageops::FilterType;
use ndarray::Array3;

use crate::error::{Result, SpotterError};
use crate::model::{INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};

/// Converts raw uploaded bytes into a model input tensor.
pub trait Preprocess: Send + Sync {
    /// Decode and normalize one image.
    fn tensor_from_bytes(&self, bytes: &[u8]) -> Result<Array3<f32>>;
}

/// Default pipeline: decode, bilinear resize to the model resolution, RGB,
/// channels-first, scaled to `[-1, 1]` with mean 0.5 and std 0.5 per channel.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    target_width: u32,
    target_height: u32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            target_width: INPUT_WIDTH as u32,
            target_height: INPUT_HEIGHT as u32,
        }
    }
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preprocess for ImagePreprocessor {
    fn tensor_from_bytes(&self, bytes: &[u8]) -> Result<Array3<f32>> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| SpotterError::Inference(format!("could not decode image: {}", e)))?;

        let resized = decoded
            .resize_exact(self.target_width, self.target_height, FilterType::Triangle)
            .to_rgb8();

        let (width, height) = (self.target_width as usize, self.target_height as usize);
        let mut tensor = Array3::zeros((INPUT_CHANNELS, height, width));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..INPUT_CHANNELS {
                tensor[[c, y as usize, x as usize]] = pixel.0[c] as f32 / 127.5 - 1.0;
            }
        }
        Ok(tensor)
    }
}
