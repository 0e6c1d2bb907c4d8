//! HTTP API for driving pizza order sagas.
//!
//! Orders are placed over HTTP and participant outcomes are reported per
//! order, mirroring an interactive session against the kitchen. Structured
//! logging comes from tracing and counters are exported to Prometheus.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use event_bus::EventBus;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{DeadlineTimer, KitchenSaga, register_auto_responders};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/state", delete(routes::orders::reset_all))
        .route(
            "/orders/{id}/actions/{action}",
            post(routes::orders::action),
        )
        .route(
            "/orders/{id}/state",
            get(routes::orders::get_state).delete(routes::orders::reset_state),
        )
        .route("/orders/{id}/events", get(routes::orders::events))
        .route("/events", get(routes::events::list))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state: a fresh bus with the kitchen subscribed.
///
/// With `auto_fulfill` the automatic participant responders are subscribed
/// too, so every order completes on its own.
pub async fn create_default_state(config: &Config) -> Arc<AppState> {
    let bus = EventBus::new();
    let kitchen = Arc::new(KitchenSaga::default());
    kitchen.register(&bus).await;

    if config.auto_fulfill {
        register_auto_responders(&bus).await;
        tracing::info!("automatic participant responders enabled");
    }

    Arc::new(AppState::new(
        bus,
        kitchen,
        DeadlineTimer::new(config.order_timeout),
    ))
}
