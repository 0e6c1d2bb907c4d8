//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub events_published: usize,
    pub pending_deadlines: usize,
}

/// GET /health: reports liveness and bus activity.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        events_published: state.bus.event_count().await,
        pending_deadlines: state.pending_deadlines().await,
    })
}
