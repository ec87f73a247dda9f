//! Model readiness lifecycle
//!
//! The model artifact is fetched and loaded in a background task while the
//! HTTP server starts immediately. `ReadinessController` is the shared
//! handle both sides use: the startup task publishes the terminal outcome,
//! request handlers observe it without locking.
//!
//! States: `Loading` -> `Ready` or `Loading` -> `Error`, both terminal. The
//! model slot is written before the state flips to ready, so any handler
//! that observes `Ready` can take the model without a second check.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::artifact::{ArtifactFetcher, ArtifactStore};
use crate::error::{Result, SpotterError};
use crate::model::{Classifier, ClassifierLoader};

const STATE_LOADING: u8 = 0;
const STATE_READY: u8 = 1;
const STATE_ERROR: u8 = 2;

/// Observable startup state of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Fetch and load still in progress.
    Loading,
    /// Model published and serving.
    Ready,
    /// Startup failed. Terminal until the process restarts.
    Error,
}

impl ReadinessState {
    /// Wire name used in health responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessState::Loading => "loading",
            ReadinessState::Ready => "ready",
            ReadinessState::Error => "error",
        }
    }
}

impl std::fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared readiness handle.
///
/// State reads are a single atomic load. The watch channel mirrors every
/// transition so callers can await a terminal state instead of polling.
pub struct ReadinessController {
    state: AtomicU8,
    model: OnceLock<Arc<dyn Classifier>>,
    failure: OnceLock<String>,
    transitions: watch::Sender<ReadinessState>,
}

impl ReadinessController {
    /// New controller in the `Loading` state.
    pub fn new() -> Arc<Self> {
        let (transitions, _) = watch::channel(ReadinessState::Loading);
        Arc::new(Self {
            state: AtomicU8::new(STATE_LOADING),
            model: OnceLock::new(),
            failure: OnceLock::new(),
            transitions,
        })
    }

    /// Current state.
    pub fn state(&self) -> ReadinessState {
        match self.state.load(Ordering::SeqCst) {
            STATE_READY => ReadinessState::Ready,
            STATE_ERROR => ReadinessState::Error,
            _ => ReadinessState::Loading,
        }
    }

    /// The published model, only once the state is `Ready`.
    pub fn model(&self) -> Option<Arc<dyn Classifier>> {
        if self.state() != ReadinessState::Ready {
            return None;
        }
        self.model.get().cloned()
    }

    /// Retained failure message after an `Error` transition.
    pub fn failure(&self) -> Option<String> {
        self.failure.get().cloned()
    }

    /// Watch receiver observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.transitions.subscribe()
    }

    /// Publish a loaded model and flip to `Ready`. The first terminal
    /// transition wins; later calls are ignored.
    pub fn publish_ready(&self, model: Arc<dyn Classifier>) {
        if self.model.set(model).is_err() {
            warn!("model already published, ignoring duplicate");
            return;
        }
        if self
            .state
            .compare_exchange(STATE_LOADING, STATE_READY, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(state = %self.state(), "readiness already terminal, ignoring ready transition");
            return;
        }
        self.transitions.send_replace(ReadinessState::Ready);
    }

    /// Record a startup failure and flip to `Error`. The first terminal
    /// transition wins; later calls are ignored.
    pub fn publish_error(&self, message: impl Into<String>) {
        let message = message.into();
        let _ = self.failure.set(message);
        if self
            .state
            .compare_exchange(STATE_LOADING, STATE_ERROR, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(state = %self.state(), "readiness already terminal, ignoring error transition");
            return;
        }
        self.transitions.send_replace(ReadinessState::Error);
    }

    /// Spawn the startup job: fetch the artifact, load it on a blocking
    /// thread, publish the outcome. Returns the task handle so callers can
    /// observe or await completion.
    pub fn start<S, L>(self: Arc<Self>, fetcher: ArtifactFetcher<S>, loader: L) -> JoinHandle<()>
    where
        S: ArtifactStore,
        L: ClassifierLoader,
    {
        tokio::spawn(async move {
            match prepare_model(fetcher, loader).await {
                Ok(model) => {
                    info!("model ready for inference");
                    self.publish_ready(model);
                }
                Err(e) => {
                    error!(error = %e, "model startup failed");
                    self.publish_error(e.to_string());
                }
            }
        })
    }
}

async fn prepare_model<S, L>(fetcher: ArtifactFetcher<S>, loader: L) -> Result<Arc<dyn Classifier>>
where
    S: ArtifactStore,
    L: ClassifierLoader,
{
    let path = fetcher.ensure_local().await?;
    tokio::task::spawn_blocking(move || loader.load(&path))
        .await
        .map_err(|e| SpotterError::Load(format!("loader task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use ndarray::{Array1, Array3};
    use std::path::Path;

    struct StubClassifier;

    impl Classifier for StubClassifier {
        fn class_scores(&self, _input: &Array3<f32>) -> Result<Array1<f32>> {
            Ok(Array1::zeros(10))
        }

        fn num_classes(&self) -> usize {
            10
        }
    }

    struct StubLoader;

    impl ClassifierLoader for StubLoader {
        fn load(&self, _path: &Path) -> Result<Arc<dyn Classifier>> {
            Ok(Arc::new(StubClassifier))
        }
    }

    struct StaticStore(Vec<u8>);

    impl ArtifactStore for StaticStore {
        async fn fetch(&self, _bucket: &str, _blob: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingStore;

    impl ArtifactStore for FailingStore {
        async fn fetch(&self, _bucket: &str, _blob: &str) -> Result<Vec<u8>> {
            Err(SpotterError::Fetch("bucket unreachable".to_string()))
        }
    }

    fn settings(dir: &Path) -> Settings {
        Settings::from_env()
            .with_bucket("models")
            .with_blob("weights.bin")
            .with_cache_path(dir.join("model.bin"))
    }

    #[test]
    fn test_initial_state() {
        let controller = ReadinessController::new();
        assert_eq!(controller.state(), ReadinessState::Loading);
        assert!(controller.model().is_none());
        assert!(controller.failure().is_none());
    }

    #[test]
    fn test_publish_ready() {
        let controller = ReadinessController::new();
        controller.publish_ready(Arc::new(StubClassifier));
        assert_eq!(controller.state(), ReadinessState::Ready);
        assert!(controller.model().is_some());
    }

    #[test]
    fn test_publish_error_retains_message() {
        let controller = ReadinessController::new();
        controller.publish_error("artifact fetch failed: HTTP 403");
        assert_eq!(controller.state(), ReadinessState::Error);
        assert!(controller.model().is_none());
        assert_eq!(
            controller.failure().as_deref(),
            Some("artifact fetch failed: HTTP 403")
        );
    }

    #[test]
    fn test_terminal_state_wins() {
        let controller = ReadinessController::new();
        controller.publish_error("first failure");
        controller.publish_ready(Arc::new(StubClassifier));
        assert_eq!(controller.state(), ReadinessState::Error);
        assert!(controller.model().is_none());

        let controller = ReadinessController::new();
        controller.publish_ready(Arc::new(StubClassifier));
        controller.publish_error("late failure");
        assert_eq!(controller.state(), ReadinessState::Ready);
    }

    #[tokio::test]
    async fn test_watch_observes_transition() {
        let controller = ReadinessController::new();
        let mut rx = controller.subscribe();
        assert_eq!(*rx.borrow(), ReadinessState::Loading);

        controller.publish_ready(Arc::new(StubClassifier));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ReadinessState::Ready);
    }

    #[tokio::test]
    async fn test_start_reaches_ready() {
        let dir = tempfile::tempdir().unwrap();
        let controller = ReadinessController::new();
        let fetcher = ArtifactFetcher::new(StaticStore(b"weights".to_vec()), &settings(dir.path()));

        let handle = controller.clone().start(fetcher, StubLoader);
        handle.await.unwrap();

        assert_eq!(controller.state(), ReadinessState::Ready);
        assert_eq!(controller.model().unwrap().num_classes(), 10);
    }

    #[tokio::test]
    async fn test_start_fetch_failure_reaches_error() {
        let dir = tempfile::tempdir().unwrap();
        let controller = ReadinessController::new();
        let fetcher = ArtifactFetcher::new(FailingStore, &settings(dir.path()));

        let handle = controller.clone().start(fetcher, StubLoader);
        handle.await.unwrap();

        assert_eq!(controller.state(), ReadinessState::Error);
        let failure = controller.failure().unwrap();
        assert!(failure.contains("bucket unreachable"));
    }

    #[tokio::test]
    async fn test_start_load_failure_reaches_error() {
        struct CorruptLoader;

        impl ClassifierLoader for CorruptLoader {
            fn load(&self, _path: &Path) -> Result<Arc<dyn Classifier>> {
                Err(SpotterError::Load("truncated artifact".to_string()))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let controller = ReadinessController::new();
        let fetcher = ArtifactFetcher::new(StaticStore(b"junk".to_vec()), &settings(dir.path()));

        let handle = controller.clone().start(fetcher, CorruptLoader);
        handle.await.unwrap();

        assert_eq!(controller.state(), ReadinessState::Error);
        assert!(controller.failure().unwrap().contains("truncated artifact"));
    }
}
