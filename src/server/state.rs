//! Application state management

use std::sync::Arc;

use crate::preprocess::{ImagePreprocessor, Preprocess};
use crate::readiness::ReadinessController;

use super::ServerConfig;

/// Application state shared across handlers.
///
/// The readiness controller is injected rather than created here so the
/// startup job, the handlers, and the tests all observe the same instance.
pub struct AppState {
    pub config: ServerConfig,
    pub readiness: Arc<ReadinessController>,
    pub preprocessor: Arc<dyn Preprocess>,
}

impl AppState {
    pub fn new(config: ServerConfig, readiness: Arc<ReadinessController>) -> Self {
        Self {
            config,
            readiness,
            preprocessor: Arc::new(ImagePreprocessor::new()),
        }
    }

    /// Swap the preprocessing pipeline. Used by tests to drive handlers with
    /// a deterministic tensor source.
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn Preprocess>) -> Self {
        self.preprocessor = preprocessor;
        self
    }
}
