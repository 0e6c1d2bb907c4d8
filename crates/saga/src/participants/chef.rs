//! Chef participant.

use common::OrderId;
use domain::EventData;

/// Source of chef events.
pub const SOURCE: &str = "chef-service";

/// Reason used when a chef shortage is reported without one.
pub const DEFAULT_FAILURE_REASON: &str = "no-chef-on-shift";

/// Chefs on the roster.
pub const ROSTER: [&str; 5] = [
    "chef-mario",
    "chef-luigi",
    "chef-peach",
    "chef-toad",
    "chef-yoshi",
];

/// Picks a chef for the order.
///
/// The same order always gets the same chef.
pub fn pick_chef(order_id: &OrderId) -> &'static str {
    let hash = order_id
        .as_str()
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    ROSTER[hash % ROSTER.len()]
}

/// A chef assignment for the order.
pub fn chef_assigned(order_id: &OrderId) -> EventData {
    EventData::chef_assigned(pick_chef(order_id))
}

pub fn chef_unavailable(reason: impl Into<String>) -> EventData {
    EventData::chef_unavailable(reason)
}
