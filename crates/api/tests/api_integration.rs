//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::AppState;
use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = api::create_default_state(&config).await;
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn setup() -> axum::Router {
    setup_with_config(Config::default()).await.0
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_order(app: &axum::Router, order_id: &str, customer_id: &str) -> Value {
    let (status, json) = send(
        app,
        post_json(
            "/orders",
            json!({
                "order_id": order_id,
                "customer_id": customer_id,
                "pizza_type": "margherita"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

async fn act(app: &axum::Router, order_id: &str, action: &str) -> Value {
    let (status, json) = send(app, post(&format!("/orders/{order_id}/actions/{action}"))).await;
    assert_eq!(status, StatusCode::OK, "action {action} failed: {json}");
    json
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["events_published"], 0);
}

#[tokio::test]
async fn test_create_order() {
    let app = setup().await;

    let (status, json) = send(
        &app,
        post_json(
            "/orders",
            json!({ "customer_id": "alice", "pizza_type": "pepperoni" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let order_id = json["order_id"].as_str().unwrap();
    assert_eq!(order_id.len(), 5);
    assert_eq!(json["subject"], format!("customer/alice/orders/{order_id}"));
    assert_eq!(
        json["trace_context"].as_str().unwrap().split('-').count(),
        4
    );

    let (_, events) = send(&app, get(&format!("/orders/{order_id}/events"))).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "order.created");
    assert_eq!(events[0]["source"], "order-service");
    assert_eq!(events[0]["data"]["pizzaType"], "pepperoni");
    assert_eq!(events[0]["data"]["totalAmount"], 11.99);
    assert_eq!(events[0]["id"], json["event_id"]);
}

#[tokio::test]
async fn test_create_order_defaults_to_guest() {
    let app = setup().await;

    let (_, json) = send(
        &app,
        post_json("/orders", json!({ "order_id": "100", "pizza_type": "veggie" })),
    )
    .await;

    assert_eq!(json["subject"], "customer/guest/orders/100");
}

#[tokio::test]
async fn test_create_order_continues_traceparent_header() {
    let app = setup().await;
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .header(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )
        .body(Body::from(json!({ "pizza_type": "veggie" }).to_string()))
        .unwrap();

    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    let trace = json["trace_context"].as_str().unwrap();
    assert!(trace.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
    assert!(!trace.contains("00f067aa0ba902b7"));
}

#[tokio::test]
async fn test_unknown_pizza_is_rejected() {
    let app = setup().await;

    let (status, json) = send(
        &app,
        post_json("/orders", json!({ "pizza_type": "hawaiian" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("hawaiian"));
}

#[tokio::test]
async fn test_duplicate_order_id_conflicts() {
    let app = setup().await;
    create_order(&app, "200", "alice").await;

    let (status, _) = send(
        &app,
        post_json(
            "/orders",
            json!({ "order_id": "200", "pizza_type": "margherita" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_orders_create_once() {
    let app = setup().await;

    let mut requests = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let app = app.clone();
        requests.spawn(async move {
            let request = post_json(
                "/orders",
                json!({ "order_id": "250", "customer_id": "ivan", "pizza_type": "veggie" }),
            );
            send(&app, request).await.0
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = requests.join_next().await {
        statuses.push(status.unwrap());
    }
    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!((created, conflicts), (1, 7), "{statuses:?}");

    let (_, events) = send(&app, get("/events?type=order.created")).await;
    assert_eq!(events.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_path_order_id_with_slash_is_rejected() {
    let app = setup().await;

    let (status, json) = send(&app, post("/orders/a%2Fb/actions/payment-success")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("a/b"));

    for uri in ["/orders/a%2Fb/state", "/orders/a%2Fb/events"] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    let (status, _) = send(&app, delete("/orders/a%2Fb/state")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, events) = send(&app, get("/events")).await;
    assert!(events.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_flow_reaches_ready() {
    let (app, state) = setup_with_config(Config::default()).await;
    let created = create_order(&app, "300", "bob").await;
    assert_eq!(state.pending_deadlines().await, 1);

    let json = act(&app, "300", "chef-assigned").await;
    assert_eq!(json["status"], "waiting");
    assert_eq!(json["chef_received"], true);

    act(&app, "300", "payment-success").await;
    let json = act(&app, "300", "inventory-reserved").await;
    assert_eq!(json["status"], "ready");
    assert_eq!(state.pending_deadlines().await, 0);

    let (status, json) = send(&app, get("/orders/300/state")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");

    let (_, events) = send(&app, get("/orders/300/events")).await;
    let events = events.as_array().unwrap();
    let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        vec![
            "order.created",
            "chef.assigned",
            "payment.completed",
            "inventory.reserved"
        ]
    );
    let trace_id = created["trace_context"].as_str().unwrap().split('-').nth(1).unwrap();
    assert!(
        events
            .iter()
            .all(|e| e["traceparent"].as_str().unwrap().contains(trace_id))
    );
    assert_eq!(events[2]["data"]["paymentId"], "pay-300");
}

#[tokio::test]
async fn test_failure_is_terminal_and_compensates() {
    let app = setup().await;
    create_order(&app, "400", "carol").await;

    act(&app, "400", "payment-success").await;
    let json = act(&app, "400", "chef-unavailable").await;
    assert_eq!(json["status"], "failed");
    assert_eq!(json["failure_reason"], "chef unavailable: no-chef-on-shift");
    assert_eq!(json["compensations"], json!(["refund"]));

    let json = act(&app, "400", "inventory-reserved").await;
    assert_eq!(json["status"], "failed");
    assert_eq!(json["inventory_received"], true);
    assert_eq!(json["compensations"], json!(["refund"]));
}

#[tokio::test]
async fn test_action_without_order_uses_unknown_customer() {
    let app = setup().await;

    let json = act(&app, "500", "payment-failure").await;
    assert_eq!(json["status"], "failed");

    let (_, events) = send(&app, get("/orders/500/events")).await;
    assert_eq!(events[0]["subject"], "customer/unknown/orders/500");
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let app = setup().await;
    create_order(&app, "600", "dave").await;

    let (status, json) = send(&app, post("/orders/600/actions/quit")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("payment-success"));
}

#[tokio::test]
async fn test_state_not_found() {
    let app = setup().await;
    create_order(&app, "700", "erin").await;

    let (status, json) = send(&app, get("/orders/700/state")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_reset_one_and_all() {
    let app = setup().await;
    for id in ["800", "801"] {
        create_order(&app, id, "frank").await;
        act(&app, id, "payment-success").await;
    }

    let (status, _) = send(&app, delete("/orders/800/state")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(send(&app, get("/orders/800/state")).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, get("/orders/801/state")).await.0, StatusCode::OK);

    let (status, _) = send(&app, delete("/orders/state")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(send(&app, get("/orders/801/state")).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_log_filters() {
    let app = setup().await;
    create_order(&app, "900", "grace").await;
    create_order(&app, "901", "heidi").await;
    act(&app, "900", "payment-success").await;

    let (_, all) = send(&app, get("/events")).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, created) = send(&app, get("/events?type=order.created")).await;
    assert_eq!(created.as_array().unwrap().len(), 2);

    let (_, payments) = send(&app, get("/events?source=payment-service")).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);

    let (_, limited) = send(&app, get("/events?limit=1")).await;
    assert_eq!(limited[0]["subject"], "customer/grace/orders/900");
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/events?type=order.shipped")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auto_fulfill_completes_orders() {
    let config = Config {
        auto_fulfill: true,
        ..Config::default()
    };
    let (app, state) = setup_with_config(config).await;

    create_order(&app, "1000", "ivan").await;

    let (status, json) = send(&app, get("/orders/1000/state")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
    assert_eq!(state.pending_deadlines().await, 0);

    let (_, events) = send(&app, get("/orders/1000/events")).await;
    assert_eq!(events.as_array().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_times_out_order() {
    let config = Config {
        order_timeout: Duration::from_secs(30),
        ..Config::default()
    };
    let (app, _) = setup_with_config(config).await;
    create_order(&app, "1100", "judy").await;
    act(&app, "1100", "inventory-reserved").await;

    tokio::time::sleep(Duration::from_secs(31)).await;

    let (_, json) = send(&app, get("/orders/1100/state")).await;
    assert_eq!(json["status"], "timeout");
    assert_eq!(json["failure_reason"], "timeout waiting for all events");
    assert_eq!(json["compensations"], json!(["release_inventory"]));

    let json = act(&app, "1100", "payment-success").await;
    assert_eq!(json["status"], "timeout");
    assert_eq!(json["payment_received"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    create_order(&app, "1200", "mallory").await;

    let response = app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("bus_events_published_total"));
}
