//! `IntoResponse` mapping for the control-plane surface, grounded on the
//! teacher's `impl IntoResponse for FacilitatorLocalError` in `handlers.rs`:
//! one match per underlying error source, one status code per case, no
//! leaking of internal error detail past a log line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use relayer_queue::QueueError;
use relayer_store::StoreError;
use relayer_types::MessageId;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("message {0} was not found")]
    MessageNotFound(MessageId),

    #[error("message id {0:?} is not a valid 0x-prefixed 32-byte hex string")]
    InvalidMessageId(String),

    #[error("message is not in a retryable state: {0}")]
    NotRetryable(StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MessageNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidMessageId(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotRetryable(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Store(StoreError::MessageNotFound(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Store(_) | ApiError::Queue(_) => {
                tracing::warn!(error = %self, "control-plane request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
