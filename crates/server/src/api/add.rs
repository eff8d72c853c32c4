//! Inbound notification endpoints.
//!
//! Each endpoint acknowledges as soon as the notification is normalized.
//! Subtitle work happens later on the command queue.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subrecall_core::normalizer::{EpisodeEvent, EpisodeOutcome, MovieEvent};
use subrecall_core::NormalizeError;

use crate::state::AppState;

/// Request body for a direct add
#[derive(Debug, Deserialize)]
pub struct AddVideoBody {
    pub path: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    /// "queued", "polling" or "ignored"
    pub status: String,
    /// Commands enqueued by this request
    pub enqueued: usize,
}

impl AddResponse {
    fn new(status: &str, enqueued: usize) -> Json<Self> {
        Json(Self {
            status: status.to_string(),
            enqueued,
        })
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub struct ApiError(NormalizeError);

impl From<NormalizeError> for ApiError {
    fn from(e: NormalizeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NormalizeError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            NormalizeError::NotConfigured(_) | NormalizeError::Queue(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub async fn add_video(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddVideoBody>,
) -> Result<Json<AddResponse>, ApiError> {
    state.normalizer().handle_direct(&body.path, body.name)?;
    Ok(AddResponse::new("queued", 1))
}

/// Episode manager webhook. Lookups of the episode files happen before the
/// response is sent; the subtitle work does not.
pub async fn episode_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<EpisodeEvent>,
) -> Result<Json<AddResponse>, ApiError> {
    match state.normalizer().handle_episode_event(&event).await? {
        EpisodeOutcome::Ignored => Ok(AddResponse::new("ignored", 0)),
        EpisodeOutcome::Enqueued(count) => Ok(AddResponse::new("queued", count)),
    }
}

/// Movie manager webhook. Responds before the release file is known.
pub async fn movie_event(
    State(state): State<Arc<AppState>>,
    Form(event): Form<MovieEvent>,
) -> Result<Json<AddResponse>, ApiError> {
    match state.normalizer().handle_movie_event(&event)? {
        Some(_) => Ok(AddResponse::new("polling", 0)),
        None => Ok(AddResponse::new("ignored", 0)),
    }
}
