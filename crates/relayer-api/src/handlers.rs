//! Handlers for the control interface as external collaborator
//! inputs: `query_message`, `enqueue_manual_retry`, `pause_chain`,
//! `resume_chain`, plus the read-only status surface. Shaped after the
//! teacher's `handlers.rs` — free functions taking `State<ApiState>`,
//! `#[instrument(skip_all)]`, `impl IntoResponse` returning `(StatusCode,
//! Json<_>)`.
//!
//! Authentication and rate-limiting of callers are explicitly out of scope
//! — this router is mounted with no auth middleware, and callers
//! are expected to sit behind a trusted operator network or a gateway that
//! adds both.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use relayer_types::{ChainId, Message, MessageId};

use crate::error::ApiError;
use crate::state::ApiState;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/healthz", get(get_healthz))
        .route("/status", get(get_status))
        .route("/messages/{id}", get(get_message))
        .route("/messages/{id}/retry", post(post_retry_message))
        .route("/messages", get(get_messages_by_sender))
        .route("/chains/{id}/pause", post(post_pause_chain))
        .route("/chains/{id}/resume", post(post_resume_chain))
}

fn parse_message_id(raw: &str) -> Result<MessageId, ApiError> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(trimmed).map_err(|_| ApiError::InvalidMessageId(raw.to_string()))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ApiError::InvalidMessageId(raw.to_string()))?;
    Ok(MessageId(array))
}

#[instrument(skip_all)]
pub async fn get_healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /messages/:id` (`query_message(message_id) -> MessageView`).
/// Returns the stored [`Message`] directly — its public fields already are
/// the "status, reason, and latest signed attempt's transaction hash" view
///; there is no separate projection type.
#[instrument(skip(state))]
pub async fn get_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let message_id = parse_message_id(&id)?;
    let message = state
        .store
        .get_message(message_id)
        .await?
        .ok_or(ApiError::MessageNotFound(message_id))?;
    Ok(Json(message))
}

#[derive(Debug, Deserialize)]
pub struct BySenderQuery {
    pub sender: String,
}

/// `GET /messages?sender=...`: listing behind the per-sender rate-limit
/// bookkeeping, exposed read-only for operator lookups.
#[instrument(skip(state))]
pub async fn get_messages_by_sender(
    State(state): State<ApiState>,
    Query(query): Query<BySenderQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.store.find_by_sender(&query.sender).await?;
    Ok(Json(messages))
}

/// `POST /messages/:id/retry` (`enqueue_manual_retry(message_id)`).
/// Only succeeds for a message parked in `Failed` or `Abandoned` — an
/// operator override of the worker's own state machine, never a bypass of
/// it while a message is in flight.
#[instrument(skip(state))]
pub async fn post_retry_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let message_id = parse_message_id(&id)?;
    state
        .store
        .retry_message(message_id)
        .await
        .map_err(ApiError::NotRetryable)?;
    let message = state
        .store
        .get_message(message_id)
        .await?
        .ok_or(ApiError::MessageNotFound(message_id))?;
    state
        .queue
        .enqueue(
            message_id,
            &message.source_chain,
            &message.destination_chain,
            &state.consumer_group,
        )
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /chains/:id/pause` (`pause_chain(chain_id)`, §7
/// "Resource exhaustion... pause Listener"). Takes effect on that chain's
/// Listener's next tick.
#[instrument(skip(state))]
pub async fn post_pause_chain(State(state): State<ApiState>, Path(id): Path<String>) -> StatusCode {
    state.pause.pause(ChainId::from(id));
    StatusCode::NO_CONTENT
}

/// `POST /chains/:id/resume` (`resume_chain(chain_id)`).
#[instrument(skip(state))]
pub async fn post_resume_chain(State(state): State<ApiState>, Path(id): Path<String>) -> StatusCode {
    state.pause.resume(&ChainId::from(id));
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    queue_pending: u64,
}

/// Read-only status endpoint: the "gauges for queue depth" half of 's
/// metrics surface. Per-status counters and latency histograms require a
/// metrics export format, which puts out of scope — this endpoint
/// stays a plain JSON snapshot rather than a Prometheus exposition.
#[instrument(skip(state))]
pub async fn get_status(State(state): State<ApiState>) -> Result<Json<serde_json::Value>, ApiError> {
    let queue_pending = state.queue.pending_count(&state.consumer_group).await?;
    Ok(Json(json!(StatusResponse { queue_pending })))
}
