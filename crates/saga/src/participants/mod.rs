//! Participant stubs that feed the kitchen.
//!
//! Participants either answer `order.created` automatically (see
//! [`register_auto_responders`]) or are driven by hand through [`emit`].

pub mod chef;
pub mod inventory;
pub mod order;
pub mod payment;

use async_trait::async_trait;
use common::{OrderId, Subject};
use domain::EventData;
use event_bus::{Event, EventBus, EventHandler, EventType, HandlerError, SubscriptionId};

use crate::error::Result;

pub use order::{MENU, OrderRequest, Pizza, create_order, place_order};

/// A participant response to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    PaymentSucceeded,
    PaymentFailed(String),
    InventoryReserved,
    InventoryFailed(String),
    ChefAssigned,
    ChefUnavailable(String),
}

impl Outcome {
    /// Every action name accepted by [`Outcome::from_action`].
    pub const ACTIONS: [&'static str; 6] = [
        "payment-success",
        "payment-failure",
        "inventory-reserved",
        "inventory-failed",
        "chef-assigned",
        "chef-unavailable",
    ];

    /// Parses an action name, using the default reason for failures.
    pub fn from_action(action: &str) -> Option<Self> {
        let outcome = match action {
            "payment-success" => Outcome::PaymentSucceeded,
            "payment-failure" => Outcome::PaymentFailed(payment::DEFAULT_FAILURE_REASON.into()),
            "inventory-reserved" => Outcome::InventoryReserved,
            "inventory-failed" => {
                Outcome::InventoryFailed(inventory::DEFAULT_FAILURE_REASON.into())
            }
            "chef-assigned" => Outcome::ChefAssigned,
            "chef-unavailable" => Outcome::ChefUnavailable(chef::DEFAULT_FAILURE_REASON.into()),
            _ => return None,
        };
        Some(outcome)
    }

    /// The participant that reports this outcome.
    pub fn source(&self) -> &'static str {
        match self {
            Outcome::PaymentSucceeded | Outcome::PaymentFailed(_) => payment::SOURCE,
            Outcome::InventoryReserved | Outcome::InventoryFailed(_) => inventory::SOURCE,
            Outcome::ChefAssigned | Outcome::ChefUnavailable(_) => chef::SOURCE,
        }
    }

    /// Builds the payload reported for `order_id`.
    pub fn data(&self, order_id: &OrderId) -> EventData {
        match self {
            Outcome::PaymentSucceeded => payment::payment_completed(order_id),
            Outcome::PaymentFailed(reason) => payment::payment_failed(reason.clone()),
            Outcome::InventoryReserved => inventory::inventory_reserved(order_id),
            Outcome::InventoryFailed(reason) => inventory::inventory_failed(reason.clone()),
            Outcome::ChefAssigned => chef::chef_assigned(order_id),
            Outcome::ChefUnavailable(reason) => chef::chef_unavailable(reason.clone()),
        }
    }
}

/// Publishes a participant outcome for an order and returns the event.
///
/// The event continues the order's root `order.created` when one is in the
/// log. Otherwise it starts a new trace under `customer/unknown/orders/<id>`.
#[tracing::instrument(skip(bus), fields(order_id = %order_id))]
pub async fn emit(bus: &EventBus, order_id: &OrderId, outcome: Outcome) -> Result<Event> {
    let data = outcome.data(order_id);
    let event = match bus.find_order_created(order_id).await {
        Some(root) => Event::child_of(&root, outcome.source(), data),
        None => {
            tracing::warn!("no order.created found, emitting with unknown customer");
            Event::builder(data)
                .source(outcome.source())
                .subject(Subject::unknown_customer(order_id.clone()))
                .build()
        }
    };

    bus.publish(event.clone()).await?;
    Ok(event)
}

/// Answers every `order.created` with a successful participant response.
struct Responder {
    name: &'static str,
    source: &'static str,
    respond: fn(&OrderId) -> EventData,
}

#[async_trait]
impl EventHandler for Responder {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, bus: &EventBus, event: &Event) -> std::result::Result<(), HandlerError> {
        let order_id = event.order_id().cloned().unwrap_or_else(OrderId::unknown);
        let response = Event::child_of(event, self.source, (self.respond)(&order_id));
        tracing::debug!(%order_id, responder = self.name, "auto-responding to order");
        bus.publish(response).await?;
        Ok(())
    }
}

/// Subscribes payment, inventory and chef responders that approve every order.
pub async fn register_auto_responders(bus: &EventBus) -> Vec<SubscriptionId> {
    let responders = [
        Responder {
            name: "payment-responder",
            source: payment::SOURCE,
            respond: payment::payment_completed,
        },
        Responder {
            name: "inventory-responder",
            source: inventory::SOURCE,
            respond: inventory::inventory_reserved,
        },
        Responder {
            name: "chef-responder",
            source: chef::SOURCE,
            respond: chef::chef_assigned,
        },
    ];

    let mut ids = Vec::with_capacity(responders.len());
    for responder in responders {
        ids.push(bus.subscribe(EventType::OrderCreated, responder).await);
    }
    ids
}
