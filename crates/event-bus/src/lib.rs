//! In-process event bus for the pizza order saga.
//!
//! Events are immutable envelopes ([`Event`]) carrying a typed payload and a
//! causal [`TraceContext`]. The [`EventBus`] records every published event in
//! an append-only log and dispatches it to the handlers subscribed to its
//! type, one after the other, in subscription order.

pub mod bus;
pub mod error;
pub mod event;
pub mod handler;
pub mod query;
pub mod trace;

pub use bus::{EventBus, SubscriptionId};
pub use common::{CustomerId, EventId, OrderId, Subject};
pub use domain::{EventData, EventType};
pub use error::{BusError, HandlerError, Result};
pub use event::{Event, EventBuilder, EventOptions, create_event};
pub use handler::{EventHandler, FnHandler, handler_fn};
pub use query::EventQuery;
pub use trace::TraceContext;
