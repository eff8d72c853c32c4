use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use subrecall_core::{Command, CommandSink, QueueStatus, SanitizedConfig};

use super::add::ErrorResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn queue_status(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.queue().status())
}

/// Block until every queued command has been processed.
pub async fn drain_queue(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    state.queue().drain().await;
    Json(state.queue().status())
}

/// Enqueue a recheck of incomplete videos without waiting for the timer.
pub async fn check_now(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, impl IntoResponse> {
    match state.queue().enqueue(Command::CheckForBetter) {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
