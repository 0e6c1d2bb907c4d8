//! Event payloads.
//!
//! Each event type has exactly one payload shape. The payload variant is the
//! source of truth for an event's type, so the two can never disagree.

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::event_type::EventType;

/// Payload of a domain event, tagged by its event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventData {
    #[serde(rename = "order.created")]
    OrderCreated(OrderCreatedData),
    #[serde(rename = "payment.completed")]
    PaymentCompleted(PaymentCompletedData),
    #[serde(rename = "payment.failed")]
    PaymentFailed(FailureData),
    #[serde(rename = "inventory.reserved")]
    InventoryReserved(InventoryReservedData),
    #[serde(rename = "inventory.failed")]
    InventoryFailed(FailureData),
    #[serde(rename = "chef.assigned")]
    ChefAssigned(ChefAssignedData),
    #[serde(rename = "chef.unavailable")]
    ChefUnavailable(FailureData),
    #[serde(rename = "order.timeout")]
    OrderTimedOut(OrderTimedOutData),
}

/// Data for order.created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedData {
    pub pizza_type: String,
    pub total_amount: f64,
}

/// Outcome reported by the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Approved,
    Declined,
}

/// Data for payment.completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompletedData {
    pub payment_id: String,
    pub status: PaymentStatus,
}

/// Data for inventory.reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReservedData {
    pub reservation_id: String,
}

/// Data for chef.assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChefAssignedData {
    pub chef_id: String,
}

/// Data shared by payment.failed, inventory.failed and chef.unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureData {
    pub reason: String,
}

/// Data for order.timeout (empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTimedOutData {}

impl EventData {
    /// Returns the event type this payload belongs to.
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::OrderCreated(_) => EventType::OrderCreated,
            EventData::PaymentCompleted(_) => EventType::PaymentCompleted,
            EventData::PaymentFailed(_) => EventType::PaymentFailed,
            EventData::InventoryReserved(_) => EventType::InventoryReserved,
            EventData::InventoryFailed(_) => EventType::InventoryFailed,
            EventData::ChefAssigned(_) => EventType::ChefAssigned,
            EventData::ChefUnavailable(_) => EventType::ChefUnavailable,
            EventData::OrderTimedOut(_) => EventType::OrderTimeout,
        }
    }

    /// Returns the reason carried by a failure-class payload.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            EventData::PaymentFailed(data)
            | EventData::InventoryFailed(data)
            | EventData::ChefUnavailable(data) => Some(&data.reason),
            _ => None,
        }
    }
}

// Convenience constructors
impl EventData {
    pub fn order_created(pizza_type: impl Into<String>, total_amount: f64) -> Self {
        EventData::OrderCreated(OrderCreatedData {
            pizza_type: pizza_type.into(),
            total_amount,
        })
    }

    /// An approved payment for the order, with id `pay-<orderId>`.
    pub fn payment_completed(order_id: &OrderId) -> Self {
        EventData::PaymentCompleted(PaymentCompletedData {
            payment_id: format!("pay-{order_id}"),
            status: PaymentStatus::Approved,
        })
    }

    pub fn payment_failed(reason: impl Into<String>) -> Self {
        EventData::PaymentFailed(FailureData {
            reason: reason.into(),
        })
    }

    /// A reservation for the order, with id `res-<orderId>`.
    pub fn inventory_reserved(order_id: &OrderId) -> Self {
        EventData::InventoryReserved(InventoryReservedData {
            reservation_id: format!("res-{order_id}"),
        })
    }

    pub fn inventory_failed(reason: impl Into<String>) -> Self {
        EventData::InventoryFailed(FailureData {
            reason: reason.into(),
        })
    }

    pub fn chef_assigned(chef_id: impl Into<String>) -> Self {
        EventData::ChefAssigned(ChefAssignedData {
            chef_id: chef_id.into(),
        })
    }

    pub fn chef_unavailable(reason: impl Into<String>) -> Self {
        EventData::ChefUnavailable(FailureData {
            reason: reason.into(),
        })
    }

    pub fn order_timed_out() -> Self {
        EventData::OrderTimedOut(OrderTimedOutData::default())
    }
}
