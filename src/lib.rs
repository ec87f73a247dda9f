//! Spotter - Image classification serving engine
//!
//! Serves a single image classification model over HTTP. The model artifact
//! lives in a remote object store, is fetched into a local cache at startup,
//! and is loaded in a background job while the server already answers health
//! checks. Requests are rejected cleanly until the model is published.
//!
//! # Modules
//!
//! ## Core
//! - [`model`] - Classifier, artifact format, weight loading
//! - [`preprocess`] - Image decoding and tensor conversion
//! - [`artifact`] - Remote store access and local caching
//! - [`readiness`] - Startup lifecycle and model publication
//!
//! ## Services
//! - [`server`] - HTTP server with health and predict endpoints
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Configuration
pub mod config;

// Core modules
pub mod artifact;
pub mod model;
pub mod preprocess;
pub mod readiness;

// Services
pub mod cli;
pub mod server;

pub use error::{Result, SpotterError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SpotterError};

    // Configuration
    pub use crate::config::Settings;

    // Model
    pub use crate::model::{
        class_name, Classifier, ClassifierLoader, ImageClassifier, ModelArtifact, WeightsLoader,
        CLASS_NAMES,
    };

    // Preprocessing
    pub use crate::preprocess::{ImagePreprocessor, Preprocess};

    // Artifact retrieval
    pub use crate::artifact::{ArtifactFetcher, ArtifactStore, GcsArtifactStore};

    // Readiness lifecycle
    pub use crate::readiness::{ReadinessController, ReadinessState};

    // Server
    pub use crate::server::{create_router, run_server, AppState, ServerConfig, ServerError};
}
