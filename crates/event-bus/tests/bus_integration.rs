//! Integration tests for the event bus.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use event_bus::{
    Event, EventBus, EventData, EventId, EventQuery, EventType, HandlerError, OrderId, Subject,
    handler_fn,
};

fn subject(customer: &str, order: &str) -> Subject {
    Subject::parse(&format!("customer/{customer}/orders/{order}")).unwrap()
}

fn order_created(customer: &str, order: &str) -> Event {
    Event::builder(EventData::order_created("margherita", 9.99))
        .source("order-service")
        .subject(subject(customer, order))
        .build()
}

/// Registers a responder that answers every order with a child event.
async fn register_responder(bus: &EventBus, source: &'static str, data: fn(&OrderId) -> EventData) {
    bus.subscribe(
        EventType::OrderCreated,
        handler_fn(source, move |bus: EventBus, event: Event| async move {
            let order_id = event.order_id().cloned().unwrap_or_else(OrderId::unknown);
            bus.publish(Event::child_of(&event, source, data(&order_id)))
                .await?;
            Ok::<(), HandlerError>(())
        }),
    )
    .await;
}

#[tokio::test]
async fn test_fan_out_keeps_causal_chain() {
    let bus = EventBus::new();
    register_responder(&bus, "payment-service", EventData::payment_completed).await;
    register_responder(&bus, "inventory-service", EventData::inventory_reserved).await;

    let root = order_created("alice", "1");
    bus.publish(root.clone()).await.unwrap();

    let events = bus.events().await;
    let types: Vec<_> = events.iter().map(Event::event_type).collect();
    assert_eq!(
        types,
        vec![
            EventType::OrderCreated,
            EventType::PaymentCompleted,
            EventType::InventoryReserved
        ]
    );

    for child in &events[1..] {
        assert_eq!(child.trace_context.trace_id(), root.trace_context.trace_id());
        assert_ne!(child.trace_context.span_id(), root.trace_context.span_id());
        assert_eq!(child.subject, root.subject);
    }
}

#[tokio::test]
async fn test_subject_filter_returns_only_that_order_in_publish_order() {
    let bus = EventBus::new();
    register_responder(&bus, "chef-service", |_| EventData::chef_assigned("chef-peach")).await;

    bus.publish(order_created("alice", "1")).await.unwrap();
    bus.publish(order_created("bob", "2")).await.unwrap();
    bus.publish(
        Event::builder(EventData::payment_failed("user-declined"))
            .source("payment-service")
            .subject(subject("alice", "1"))
            .build(),
    )
    .await
    .unwrap();

    let alice = bus.query(&EventQuery::for_subject(subject("alice", "1"))).await;
    let types: Vec<_> = alice.iter().map(Event::event_type).collect();
    assert_eq!(
        types,
        vec![
            EventType::OrderCreated,
            EventType::ChefAssigned,
            EventType::PaymentFailed
        ]
    );
    assert!(alice.iter().all(|e| e.subject == Some(subject("alice", "1"))));

    let bob = bus.query(&EventQuery::for_order(OrderId::new("2"))).await;
    assert_eq!(bob.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishers_lose_no_events() {
    let bus = EventBus::new();
    let delivered = Arc::new(AtomicUsize::new(0));

    let counter = delivered.clone();
    bus.subscribe(
        EventType::OrderCreated,
        handler_fn("counter", move |_bus, _event| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<(), HandlerError>(())
            }
        }),
    )
    .await;

    let publishers = (0..100).map(|n| {
        let bus = bus.clone();
        tokio::spawn(async move { bus.publish(order_created("load", &n.to_string())).await })
    });
    for result in futures_util::future::join_all(publishers).await {
        result.unwrap().unwrap();
    }

    assert_eq!(bus.event_count().await, 100);
    assert_eq!(delivered.load(Ordering::SeqCst), 100);

    let ids: HashSet<EventId> = bus.events().await.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn test_nested_handler_failure_propagates_to_root_publisher() {
    let bus = EventBus::new();
    register_responder(&bus, "payment-service", EventData::payment_completed).await;
    bus.subscribe(
        EventType::PaymentCompleted,
        handler_fn("ledger", |_bus, _event| async {
            Err::<(), HandlerError>("ledger unavailable".into())
        }),
    )
    .await;

    let err = bus.publish(order_created("alice", "1")).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("order.created"), "{message}");
    assert!(message.contains("ledger unavailable"), "{message}");

    // Both events made it into the log before the failure surfaced.
    assert_eq!(bus.event_count().await, 2);
}

#[test]
fn test_publish_duration_recorded_when_handler_fails() {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let bus = EventBus::new();
            bus.subscribe(
                EventType::OrderCreated,
                handler_fn("kitchen", |_bus, _event| async {
                    Err::<(), HandlerError>("oven on fire".into())
                }),
            )
            .await;

            assert!(bus.publish(order_created("alice", "1")).await.is_err());
        })
    });

    let rendered = handle.render();
    assert!(
        rendered.contains("bus_publish_duration_seconds_count 1"),
        "{rendered}"
    );
    assert!(rendered.contains("bus_handler_failures_total 1"), "{rendered}");
}
