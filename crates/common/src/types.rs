use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a published event.
///
/// Wraps a random (v4) UUID so that ids never collide within a process,
/// even when events are created concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of an order, as carried in the last segment of a subject.
///
/// Order ids are opaque strings chosen by whoever places the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Placeholder identity for events whose subject cannot be correlated.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the placeholder order id used for uncorrelated events.
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Generates a random five-digit order number.
    pub fn generate() -> Self {
        let n = Uuid::new_v4().as_u128() % 90_000 + 10_000;
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of the customer who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Customer id used when the caller does not give one.
    pub const GUEST: &'static str = "guest";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn guest() -> Self {
        Self(Self::GUEST.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
