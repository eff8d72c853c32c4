use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{add, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Inbound notifications
        .route("/add", post(add::add_video))
        .route("/add/episode-event", post(add::episode_event))
        .route("/add/movie-event", post(add::movie_event))
        // Queue
        .route("/queue", get(handlers::queue_status))
        .route("/queue/drain", post(handlers::drain_queue))
        .route("/check", post(handlers::check_now))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
