//! Saga error types.

use event_bus::BusError;
use thiserror::Error;

use crate::compensation::CompensationAction;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Publishing to the event bus failed.
    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),

    /// A compensating action could not be carried out.
    #[error("Compensation '{action}' failed: {reason}")]
    Compensation {
        action: CompensationAction,
        reason: String,
    },

    /// The pizza is not on the menu.
    #[error("Unknown pizza: {0}")]
    UnknownPizza(String),

    /// The deadline timer task panicked or was aborted.
    #[error("Deadline timer task failed: {0}")]
    TimerJoin(#[from] tokio::task::JoinError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
