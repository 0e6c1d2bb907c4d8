//! Kitchen saga for pizza orders.
//!
//! A [`KitchenSaga`] subscribes to participant events on an
//! [`event_bus::EventBus`] and waits until payment, inventory and chef have
//! all confirmed an order. The first failure, or the [`DeadlineTimer`]
//! firing first, ends the saga and triggers compensation for the work that
//! was already confirmed. Events arriving after the outcome is decided are
//! absorbed.

pub mod compensation;
pub mod error;
pub mod kitchen;
pub mod participants;
pub mod state;
pub mod store;
pub mod timer;

pub use compensation::{CompensationAction, Compensator, LoggingCompensator, RecordingCompensator};
pub use error::{Result, SagaError};
pub use kitchen::{KITCHEN_EVENTS, KitchenSaga};
pub use participants::{
    OrderRequest, Outcome, Pizza, create_order, emit, place_order, register_auto_responders,
};
pub use state::{KitchenState, SagaStatus, TIMEOUT_REASON, Transition};
pub use store::SagaStore;
pub use timer::{DeadlineTimer, TimerHandle, TimerOutcome};
