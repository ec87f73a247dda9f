//! Environment-driven configuration
//!
//! The variable names are a deployment contract: the model artifact location
//! (`MODEL_BUCKET` + `MODEL_BLOB`, or a `MODEL_URI` in `gs://bucket/path`
//! form they fall back to), the local cache path, the log level, and the
//! owning project identifier.

use std::path::PathBuf;

/// Artifact and runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Remote store bucket holding the model artifact.
    pub model_bucket: String,
    /// Blob name of the artifact within the bucket.
    pub model_blob: String,
    /// Local cache path for the fetched artifact. Exactly one file ever
    /// lives here; its presence is the fetch-completion signal.
    pub cache_path: PathBuf,
    /// Log filter applied when RUST_LOG is unset.
    pub log_level: String,
    /// Owning cloud project identifier. Recorded for startup logging.
    pub project_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Settings {
    /// Resolve settings from the environment. Explicit `MODEL_BUCKET` /
    /// `MODEL_BLOB` take precedence; otherwise both are parsed out of
    /// `MODEL_URI`. Missing values resolve to empty strings and are
    /// rejected by the fetch precondition, not here.
    pub fn from_env() -> Self {
        let uri = std::env::var("MODEL_URI").unwrap_or_default();
        let (uri_bucket, uri_blob) = parse_gs_uri(&uri).unwrap_or_default();

        let model_bucket = std::env::var("MODEL_BUCKET").unwrap_or(uri_bucket);
        let model_blob = std::env::var("MODEL_BLOB").unwrap_or(uri_blob);

        let cache_path = std::env::var("MODEL_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("spotter").join("model.bin"));

        Self {
            model_bucket,
            model_blob,
            cache_path,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "spotter=info".to_string()),
            project_id: std::env::var("PROJECT_ID").unwrap_or_default(),
        }
    }

    /// Builder method to set the bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.model_bucket = bucket.into();
        self
    }

    /// Builder method to set the blob name.
    pub fn with_blob(mut self, blob: impl Into<String>) -> Self {
        self.model_blob = blob.into();
        self
    }

    /// Builder method to set the local cache path.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }
}

/// Split a `gs://bucket/path/to/blob` URI into (bucket, blob). Returns None
/// for any other scheme or a URI without both components.
pub fn parse_gs_uri(uri: &str) -> Option<(String, String)> {
    let rest = uri.strip_prefix("gs://")?;
    let (bucket, blob) = rest.split_once('/')?;
    if bucket.is_empty() || blob.is_empty() {
        return None;
    }
    Some((bucket.to_string(), blob.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gs_uri() {
        let (bucket, blob) =
            parse_gs_uri("gs://object-classification/prod/models/v1.0.0/weights.bin").unwrap();
        assert_eq!(bucket, "object-classification");
        assert_eq!(blob, "prod/models/v1.0.0/weights.bin");
    }

    #[test]
    fn test_parse_gs_uri_rejects_other_schemes() {
        assert!(parse_gs_uri("https://bucket/blob").is_none());
        assert!(parse_gs_uri("").is_none());
    }

    #[test]
    fn test_parse_gs_uri_requires_both_components() {
        assert!(parse_gs_uri("gs://bucket-only").is_none());
        assert!(parse_gs_uri("gs:///blob-only").is_none());
        assert!(parse_gs_uri("gs://bucket/").is_none());
    }

    #[test]
    fn test_from_env_resolution_order() {
        // The only test that writes these variables; every phase runs
        // sequentially in this one body.
        std::env::set_var("MODEL_URI", "gs://uri-bucket/nested/uri-weights.bin");
        std::env::set_var("MODEL_BUCKET", "explicit-bucket");
        std::env::set_var("MODEL_BLOB", "explicit/weights.bin");

        let settings = Settings::from_env();
        assert_eq!(settings.model_bucket, "explicit-bucket");
        assert_eq!(settings.model_blob, "explicit/weights.bin");

        // Without the explicit pair, both components come from the URI.
        std::env::remove_var("MODEL_BUCKET");
        std::env::remove_var("MODEL_BLOB");

        let settings = Settings::from_env();
        assert_eq!(settings.model_bucket, "uri-bucket");
        assert_eq!(settings.model_blob, "nested/uri-weights.bin");

        // Nothing set resolves to empty; the fetch precondition rejects it.
        std::env::remove_var("MODEL_URI");

        let settings = Settings::from_env();
        assert!(settings.model_bucket.is_empty());
        assert!(settings.model_blob.is_empty());
    }

    #[test]
    fn test_builder_methods() {
        let settings = Settings {
            model_bucket: String::new(),
            model_blob: String::new(),
            cache_path: PathBuf::from("/tmp/x"),
            log_level: "info".to_string(),
            project_id: String::new(),
        }
        .with_bucket("models")
        .with_blob("v1/weights.bin")
        .with_cache_path("/tmp/cache/model.bin");

        assert_eq!(settings.model_bucket, "models");
        assert_eq!(settings.model_blob, "v1/weights.bin");
        assert_eq!(settings.cache_path, PathBuf::from("/tmp/cache/model.bin"));
    }
}
