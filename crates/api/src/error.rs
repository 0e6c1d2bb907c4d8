//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// The request clashes with existing state.
    #[error("{0}")]
    Conflict(String),
    /// Saga or bus error.
    #[error(transparent)]
    Saga(#[from] SagaError),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::UnknownPizza(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            tracing::error!(error = %err, "saga error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
