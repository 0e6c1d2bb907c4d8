//! Payment participant.

use common::OrderId;
use domain::EventData;

/// Source of payment events.
pub const SOURCE: &str = "payment-service";

/// Reason used when a payment failure is reported without one.
pub const DEFAULT_FAILURE_REASON: &str = "user-declined";

/// An approved payment for the order, with payment id `pay-<order id>`.
pub fn payment_completed(order_id: &OrderId) -> EventData {
    EventData::payment_completed(order_id)
}

pub fn payment_failed(reason: impl Into<String>) -> EventData {
    EventData::payment_failed(reason)
}
