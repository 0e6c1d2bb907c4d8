//! Event log endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::EventType;
use event_bus::{Event, EventQuery};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Optional filters for the event log.
#[derive(Debug, Default, Deserialize)]
pub struct EventLogParams {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub source: Option<String>,
    pub limit: Option<usize>,
}

impl EventLogParams {
    fn into_query(self) -> Result<EventQuery, ApiError> {
        let mut query = EventQuery::new();
        if let Some(raw) = self.event_type {
            let event_type: EventType = raw
                .parse()
                .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))?;
            query = query.event_type(event_type);
        }
        if let Some(source) = self.source {
            query = query.source(source);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

/// GET /events: the full event log, optionally filtered.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventLogParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.bus.query(&query).await))
}
