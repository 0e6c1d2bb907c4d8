//! The fixed event-type vocabulary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of a domain event.
///
/// The string forms are part of the wire format and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "payment.completed")]
    PaymentCompleted,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "inventory.reserved")]
    InventoryReserved,
    #[serde(rename = "inventory.failed")]
    InventoryFailed,
    #[serde(rename = "chef.assigned")]
    ChefAssigned,
    #[serde(rename = "chef.unavailable")]
    ChefUnavailable,
    #[serde(rename = "order.timeout")]
    OrderTimeout,
}

impl EventType {
    /// Every event type, in vocabulary order.
    pub const ALL: [EventType; 8] = [
        EventType::OrderCreated,
        EventType::PaymentCompleted,
        EventType::PaymentFailed,
        EventType::InventoryReserved,
        EventType::InventoryFailed,
        EventType::ChefAssigned,
        EventType::ChefUnavailable,
        EventType::OrderTimeout,
    ];

    /// Returns the wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "order.created",
            EventType::PaymentCompleted => "payment.completed",
            EventType::PaymentFailed => "payment.failed",
            EventType::InventoryReserved => "inventory.reserved",
            EventType::InventoryFailed => "inventory.failed",
            EventType::ChefAssigned => "chef.assigned",
            EventType::ChefUnavailable => "chef.unavailable",
            EventType::OrderTimeout => "order.timeout",
        }
    }

    /// Returns true for the participant failure events.
    ///
    /// A timeout is not a failure-class event; it has its own terminal status.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventType::PaymentFailed | EventType::InventoryFailed | EventType::ChefUnavailable
        )
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownEventType(s.to_string()))
    }
}
