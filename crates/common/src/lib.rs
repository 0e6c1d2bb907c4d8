//! Shared identifiers and correlation keys used across the workspace.

pub mod subject;
pub mod types;

pub use subject::{ParseSubjectError, Subject};
pub use types::{CustomerId, EventId, OrderId};
