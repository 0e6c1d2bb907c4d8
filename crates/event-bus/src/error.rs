use common::EventId;
use domain::EventType;
use thiserror::Error;

/// Error type returned by event handlers.
///
/// Handlers may fail for reasons the bus knows nothing about, so any error
/// type can be boxed into this.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when publishing to the event bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// A subscribed handler failed while processing an event.
    /// Handlers that already ran for the event are not rolled back.
    #[error("Handler failed for {event_type} event {event_id}: {source}")]
    Handler {
        event_type: EventType,
        event_id: EventId,
        #[source]
        source: HandlerError,
    },
}

/// Result type for event bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
