//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::SpotterError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Model is loading, try again later")]
    ModelLoading,

    #[error("Model failed to start: {0}")]
    ModelFailed(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SpotterError> for ServerError {
    fn from(err: SpotterError) -> Self {
        match err {
            SpotterError::Validation(msg) => ServerError::BadRequest(msg),
            SpotterError::Inference(msg) => ServerError::Inference(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::ModelLoading => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ServerError::ModelFailed(detail) => {
                tracing::error!(detail = %detail, "Rejecting request, model startup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::Inference(msg) => {
                tracing::error!(detail = %msg, "Inference error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ServerError::from(SpotterError::Validation(
            "Unsupported content type: text/plain (expected an image)".to_string(),
        ));
        assert!(matches!(err, ServerError::BadRequest(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_inference_maps_to_server_error() {
        let err = ServerError::from(SpotterError::Inference("empty score vector".to_string()));
        assert!(matches!(err, ServerError::Inference(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_startup_errors_collapse_to_internal() {
        let err = ServerError::from(SpotterError::Config("MODEL_BUCKET is not set".to_string()));
        assert!(matches!(err, ServerError::Internal(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
