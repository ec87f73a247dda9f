//! Spotter HTTP Server Module
//!
//! Serves image classification over a small, stable surface: a health and
//! readiness endpoint, a multipart predict endpoint, and an embedded upload
//! page. The server binds and answers health checks immediately; the model
//! becomes available when the background startup job publishes it.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::PredictResponse;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::readiness::ReadinessController;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB
        }
    }
}

/// Start the server with the given configuration and readiness handle.
pub async fn run_server(
    config: ServerConfig,
    readiness: Arc<ReadinessController>,
) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = Arc::new(AppState::new(config.clone(), readiness));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        max_upload_size_mb = config.max_upload_size / 1024 / 1024,
        started_at = %start_time.to_rfc3339(),
        "Spotter server starting"
    );
    info!(url = %format!("http://{}", addr), "Upload page available");
    info!(url = %format!("http://{}/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
    }
}
