//! Order participant: the pizza menu and order placement.

use common::{CustomerId, OrderId, Subject};
use domain::EventData;
use event_bus::{Event, EventBus};

use crate::error::{Result, SagaError};

/// Source of order events.
pub const SOURCE: &str = "order-service";

/// A pizza on the menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pizza {
    pub name: &'static str,
    pub price: f64,
}

/// Everything the kitchen can make.
pub const MENU: [Pizza; 3] = [
    Pizza {
        name: "margherita",
        price: 9.99,
    },
    Pizza {
        name: "pepperoni",
        price: 11.99,
    },
    Pizza {
        name: "veggie",
        price: 10.99,
    },
];

impl Pizza {
    /// Looks up a pizza by name, ignoring case.
    pub fn find(name: &str) -> Result<&'static Pizza> {
        MENU.iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| SagaError::UnknownPizza(name.to_string()))
    }
}

/// A request to start a new order saga.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub pizza_type: String,
    pub total_amount: f64,
    /// Trace token received from the caller, if any.
    pub traceparent: Option<String>,
}

impl OrderRequest {
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        pizza_type: impl Into<String>,
        total_amount: f64,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            pizza_type: pizza_type.into(),
            total_amount,
            traceparent: None,
        }
    }

    /// Continues the caller's trace instead of starting a new one.
    pub fn with_traceparent(mut self, traceparent: impl Into<String>) -> Self {
        self.traceparent = Some(traceparent.into());
        self
    }

    pub fn subject(&self) -> Subject {
        Subject::new(self.customer_id.clone(), self.order_id.clone())
    }
}

/// Publishes the `order.created` event that roots a saga and returns it.
#[tracing::instrument(skip(bus, request), fields(order_id = %request.order_id))]
pub async fn place_order(bus: &EventBus, request: OrderRequest) -> Result<Event> {
    let subject = request.subject();
    let mut builder = Event::builder(EventData::order_created(
        request.pizza_type,
        request.total_amount,
    ))
    .source(SOURCE)
    .subject(subject);
    if let Some(raw) = request.traceparent {
        builder = builder.traceparent(raw);
    }
    let event = builder.build();

    tracing::info!(
        customer_id = %request.customer_id,
        trace_id = event.trace_context.trace_id(),
        "placing order"
    );
    bus.publish(event.clone()).await?;
    Ok(event)
}

/// Publishes the root `order.created` event for a new order.
pub async fn create_order(
    bus: &EventBus,
    order_id: OrderId,
    customer_id: CustomerId,
    pizza_type: impl Into<String>,
    total_amount: f64,
) -> Result<Event> {
    place_order(
        bus,
        OrderRequest::new(order_id, customer_id, pizza_type, total_amount),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::EventType;

    #[test]
    fn test_menu_lookup() {
        assert_eq!(Pizza::find("pepperoni").unwrap().price, 11.99);
        assert_eq!(Pizza::find(" Veggie ").unwrap().name, "veggie");
        assert!(matches!(
            Pizza::find("hawaiian"),
            Err(SagaError::UnknownPizza(name)) if name == "hawaiian"
        ));
    }

    #[tokio::test]
    async fn test_create_order_publishes_root() {
        let bus = EventBus::new();
        let event = create_order(
            &bus,
            OrderId::new("12345"),
            CustomerId::new("alice"),
            "margherita",
            9.99,
        )
        .await
        .unwrap();

        assert_eq!(event.event_type(), EventType::OrderCreated);
        assert_eq!(event.source, SOURCE);
        assert_eq!(
            event.subject.as_ref().map(|s| s.to_string()).as_deref(),
            Some("customer/alice/orders/12345")
        );
        assert_eq!(
            bus.find_order_created(&OrderId::new("12345")).await,
            Some(event)
        );
    }

    #[tokio::test]
    async fn test_place_order_continues_caller_trace() {
        let bus = EventBus::new();
        let request = OrderRequest::new(OrderId::new("1"), CustomerId::guest(), "veggie", 10.99)
            .with_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01");

        let event = place_order(&bus, request).await.unwrap();
        assert_eq!(
            event.trace_context.trace_id(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );
        assert_ne!(event.trace_context.span_id(), "00f067aa0ba902b7");
    }

    #[tokio::test]
    async fn test_place_order_with_malformed_trace_starts_fresh() {
        let bus = EventBus::new();
        let request = OrderRequest::new(OrderId::new("1"), CustomerId::guest(), "veggie", 10.99)
            .with_traceparent("garbage");

        let event = place_order(&bus, request).await.unwrap();
        assert_eq!(event.trace_context.trace_id().len(), 32);
    }
}
