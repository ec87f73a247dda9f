//! Spotter CLI Module
//!
//! Command-line interface for serving the API, prefetching the model
//! artifact, and validating a local artifact.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactFetcher, GcsArtifactStore};
use crate::config::Settings;
use crate::model::{load_classifier, WeightsLoader};
use crate::readiness::ReadinessController;
use crate::server::{run_server, ServerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn kv(key: &str, val: &str) {
    println!("  {} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "spotter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Image classification serving engine")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the classification API
    Serve {
        /// Bind host (overrides API_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides API_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch the model artifact into the local cache and exit
    Fetch,

    /// Validate a local model artifact
    Check {
        /// Artifact path (defaults to the configured cache path)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Start the server and the background model startup job.
pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    println!();
    println!(
        "  {} {}",
        "Spotter".white().bold(),
        dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    println!();
    kv("Upload ", &format!("http://{}:{}", config.host, config.port));
    kv(
        "Health ",
        &format!("http://{}:{}/health", config.host, config.port),
    );
    if !settings.project_id.is_empty() {
        kv("Project", &settings.project_id);
    }
    println!();
    println!("  {}", dim("ctrl+c to stop"));
    println!();

    let readiness = ReadinessController::new();
    let store = GcsArtifactStore::new()?;
    let fetcher = ArtifactFetcher::new(store, &settings);
    let _startup = readiness.clone().start(fetcher, WeightsLoader);

    run_server(config, readiness).await
}

/// Download the artifact to the cache path without serving.
pub async fn cmd_fetch() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let store = GcsArtifactStore::new()?;
    let fetcher = ArtifactFetcher::new(store, &settings);

    step_run("fetching model artifact");
    let path = fetcher.ensure_local().await?;
    step_done(&path.display().to_string());
    Ok(())
}

/// Load and validate an artifact file, reporting its shape.
pub fn cmd_check(path: Option<&Path>) -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let path = path.map(Path::to_path_buf).unwrap_or(settings.cache_path);

    step_run("loading model artifact");
    let classifier = load_classifier(&path)?;
    step_done(&format!("{} classes", classifier.num_classes()));
    step_ok(&format!("artifact at {} is valid", path.display()));
    Ok(())
}
