//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Html,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::error::SpotterError;
use crate::model::{class_name, softmax};
use crate::readiness::ReadinessState;

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Health
// ============================================================================

/// Liveness and model readiness in one response. Always succeeds, never
/// waits on the model.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model_status": state.readiness.state().as_str(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============================================================================
// Inference
// ============================================================================

/// Successful classification of one uploaded image.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
}

/// Classify one uploaded image (multipart field `file`).
pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>> {
    // Readiness gate before touching the request body. Requests during
    // startup must not trigger any inference work.
    let model = match state.readiness.state() {
        ReadinessState::Ready => state
            .readiness
            .model()
            .ok_or_else(|| ServerError::Internal("model slot empty in ready state".to_string()))?,
        ReadinessState::Loading => return Err(ServerError::ModelLoading),
        ReadinessState::Error => {
            let detail = state
                .readiness
                .failure()
                .unwrap_or_else(|| "unknown startup failure".to_string());
            return Err(ServerError::ModelFailed(detail));
        }
    };

    let mut image_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        // Content type is advisory, but a declared non-image type is a
        // client error and never reaches the model.
        let content_type = field.content_type().unwrap_or("unknown").to_string();
        if !content_type.starts_with("image/") {
            return Err(SpotterError::Validation(format!(
                "Unsupported content type: {} (expected an image)",
                content_type
            ))
            .into());
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        image_bytes = Some(data.to_vec());
        break;
    }
    let image_bytes = image_bytes
        .ok_or_else(|| ServerError::BadRequest("No file uploaded in field 'file'".to_string()))?;

    info!(bytes = image_bytes.len(), "Received image for classification");

    // Decode and run the model off the async runtime.
    let preprocessor = Arc::clone(&state.preprocessor);
    let scores = tokio::task::spawn_blocking(move || {
        let tensor = preprocessor.tensor_from_bytes(&image_bytes)?;
        model.class_scores(&tensor)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("inference task failed: {}", e)))??;

    let probs = softmax(&scores);
    let (class_id, confidence) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| ServerError::Inference("empty score vector".to_string()))?;

    let label = class_name(class_id).to_string();
    info!(class_id, prediction = %label, confidence, "Classification complete");

    Ok(Json(PredictResponse {
        prediction: label.clone(),
        class_id,
        class_name: label,
        confidence,
    }))
}

// ============================================================================
// UI Handler
// ============================================================================

pub async fn serve_index() -> Html<String> {
    // Embedded HTML for portability
    Html(EMBEDDED_INDEX_HTML.to_string())
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Spotter</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-900 text-gray-100 min-h-screen">
    <header class="bg-gray-800 border-b border-gray-700 px-6 py-4 flex items-center justify-between">
        <h1 class="text-xl font-bold">Spotter</h1>
        <span id="status" class="text-sm text-gray-400">checking model...</span>
    </header>
    <main class="p-6 max-w-xl mx-auto">
        <div class="bg-gray-800 rounded-lg p-6">
            <h2 class="text-lg font-semibold mb-4">Classify an image</h2>
            <input id="file" type="file" accept="image/*" class="block w-full text-sm mb-4">
            <button onclick="classify()" class="px-4 py-2 bg-blue-600 rounded hover:bg-blue-500">Classify</button>
            <div id="result" class="mt-4 text-sm text-gray-300"></div>
        </div>
    </main>
    <script>
        async function refreshStatus() {
            const res = await fetch('/health');
            const body = await res.json();
            document.getElementById('status').textContent = 'model: ' + body.model_status;
            if (body.model_status === 'loading') setTimeout(refreshStatus, 1000);
        }
        async function classify() {
            const input = document.getElementById('file');
            const result = document.getElementById('result');
            if (!input.files.length) { result.textContent = 'Pick an image first.'; return; }
            const form = new FormData();
            form.append('file', input.files[0]);
            result.textContent = 'Classifying...';
            const res = await fetch('/predict', { method: 'POST', body: form });
            const body = await res.json();
            if (res.ok) {
                result.textContent = body.prediction + ' (confidence ' + body.confidence.toFixed(3) + ')';
            } else {
                result.textContent = 'Error: ' + body.message;
            }
        }
        refreshStatus();
    </script>
</body>
</html>"#;
