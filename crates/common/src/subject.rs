//! Order correlation subjects.
//!
//! Every event that belongs to an order carries a subject of the form
//! `customer/<customerId>/orders/<orderId>`.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::{CustomerId, OrderId};

const CUSTOMER_LABEL: &str = "customer";
const ORDERS_LABEL: &str = "orders";

/// Error returned when a string is not a well-formed order subject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed order subject: {0:?}")]
pub struct ParseSubjectError(pub String);

/// Correlation key grouping all events of one order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    customer_id: CustomerId,
    order_id: OrderId,
}

impl Subject {
    pub fn new(customer_id: CustomerId, order_id: OrderId) -> Self {
        Self {
            customer_id,
            order_id,
        }
    }

    /// Subject used when an order's causal root cannot be found.
    pub fn unknown_customer(order_id: OrderId) -> Self {
        Self::new(CustomerId::new("unknown"), order_id)
    }

    /// Parses `customer/<customerId>/orders/<orderId>`.
    ///
    /// Exactly four `/`-separated segments with the literal `customer` and
    /// `orders` labels are accepted; anything else is rejected.
    pub fn parse(s: &str) -> Result<Self, ParseSubjectError> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [CUSTOMER_LABEL, customer_id, ORDERS_LABEL, order_id] => Ok(Self {
                customer_id: CustomerId::new(*customer_id),
                order_id: OrderId::new(*order_id),
            }),
            _ => Err(ParseSubjectError(s.to_string())),
        }
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{CUSTOMER_LABEL}/{}/{ORDERS_LABEL}/{}",
            self.customer_id, self.order_id
        )
    }
}

impl FromStr for Subject {
    type Err = ParseSubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Subject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Subject::parse(&raw).map_err(serde::de::Error::custom)
    }
}
