//! Inventory participant.

use common::OrderId;
use domain::EventData;

/// Source of inventory events.
pub const SOURCE: &str = "inventory-service";

/// Reason used when an inventory failure is reported without one.
pub const DEFAULT_FAILURE_REASON: &str = "ingredients-unavailable";

/// A reservation for the order, with reservation id `res-<order id>`.
pub fn inventory_reserved(order_id: &OrderId) -> EventData {
    EventData::inventory_reserved(order_id)
}

pub fn inventory_failed(reason: impl Into<String>) -> EventData {
    EventData::inventory_failed(reason)
}
