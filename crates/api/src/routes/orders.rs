//! Order placement, participant actions and kitchen state endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::{CustomerId, OrderId};
use event_bus::{Event, EventQuery};
use saga::{KitchenState, OrderRequest, Outcome, Pizza, emit};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const TRACEPARENT_HEADER: &str = "traceparent";

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub pizza_type: String,
    /// Defaults to the menu price.
    pub total_amount: Option<f64>,
    /// Generated when absent.
    pub order_id: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub subject: String,
    pub event_id: String,
    pub trace_context: String,
}

// Order ids end up as the last subject segment, so they must be non-empty
// and free of '/'.
fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("order_id must not be empty".into()));
    }
    if id.contains('/') {
        return Err(ApiError::BadRequest(format!("Invalid order_id: {id}")));
    }
    Ok(OrderId::new(id))
}

// -- Handlers --

/// POST /orders: publish `order.created` and start the saga deadline.
#[tracing::instrument(skip(state, headers, req), fields(pizza_type = %req.pizza_type))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let pizza = Pizza::find(&req.pizza_type)?;
    let total_amount = req.total_amount.unwrap_or(pizza.price);
    if !total_amount.is_finite() || total_amount < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid total_amount: {total_amount}"
        )));
    }

    let order_id = match req.order_id.as_deref() {
        Some(raw) => parse_order_id(raw)?,
        None => OrderId::generate(),
    };

    let customer_id = match req.customer_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() && !id.contains('/') => CustomerId::new(id),
        Some(id) if !id.is_empty() => {
            return Err(ApiError::BadRequest(format!("Invalid customer_id: {id}")));
        }
        _ => CustomerId::guest(),
    };

    let mut request = OrderRequest::new(order_id.clone(), customer_id, pizza.name, total_amount);
    if let Some(raw) = headers
        .get(TRACEPARENT_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        request = request.with_traceparent(raw);
    }
    let subject = request.subject();

    let root = state.place_new_order(request).await?;
    metrics::counter!("api_orders_placed_total").increment(1);
    state.start_deadline(&order_id, &root).await;
    // Automatic responders may already have finished the saga.
    state.settle_deadline(&order_id).await;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: order_id.to_string(),
            subject: subject.to_string(),
            event_id: root.id.to_string(),
            trace_context: root.trace_context.to_string(),
        }),
    ))
}

/// POST /orders/{id}/actions/{action}: report a participant outcome.
#[tracing::instrument(skip(state))]
pub async fn action(
    State(state): State<Arc<AppState>>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<KitchenState>, ApiError> {
    let outcome = Outcome::from_action(&action).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unknown action '{action}', expected one of: {}",
            Outcome::ACTIONS.join(", ")
        ))
    })?;
    let order_id = parse_order_id(&id)?;

    emit(&state.bus, &order_id, outcome).await?;
    metrics::counter!("api_actions_total", "action" => action).increment(1);
    state.settle_deadline(&order_id).await;

    let kitchen_state = state
        .kitchen
        .state(&order_id)
        .await
        .ok_or_else(|| ApiError::Internal(format!("No kitchen state for order {order_id}")))?;
    Ok(Json(kitchen_state))
}

/// GET /orders/{id}/state: the kitchen's view of an order.
#[tracing::instrument(skip(state))]
pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<KitchenState>, ApiError> {
    let order_id = parse_order_id(&id)?;
    state
        .kitchen
        .state(&order_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No kitchen state recorded for order {order_id}"))
        })
}

/// DELETE /orders/{id}/state: forget one order's kitchen state.
#[tracing::instrument(skip(state))]
pub async fn reset_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.cancel_deadline(&order_id).await;
    state.kitchen.reset(Some(&order_id)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /orders/state: forget every kitchen state.
#[tracing::instrument(skip(state))]
pub async fn reset_all(State(state): State<Arc<AppState>>) -> StatusCode {
    state.cancel_all_deadlines().await;
    state.kitchen.reset(None).await;
    StatusCode::NO_CONTENT
}

/// GET /orders/{id}/events: the order's events in publish order.
#[tracing::instrument(skip(state))]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.bus.query(&EventQuery::for_order(order_id)).await))
}
