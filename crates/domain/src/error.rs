//! Domain error types.

use thiserror::Error;

/// Errors that can occur when interpreting domain vocabulary.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The string is not part of the event-type vocabulary.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
