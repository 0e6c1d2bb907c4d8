//! Domain vocabulary for the pizza order saga.
//!
//! This crate provides:
//! - [`EventType`], the fixed set of event kinds exchanged on the bus
//! - [`EventData`], the closed payload union with one shape per event type

pub mod error;
pub mod event_type;
pub mod payload;

pub use error::DomainError;
pub use event_type::EventType;
pub use payload::{
    ChefAssignedData, EventData, FailureData, InventoryReservedData, OrderCreatedData,
    OrderTimedOutData, PaymentCompletedData, PaymentStatus,
};
