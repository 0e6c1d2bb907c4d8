//! Event handler trait and closure adapter.

use std::future::Future;

use async_trait::async_trait;

use crate::bus::EventBus;
use crate::error::HandlerError;
use crate::event::Event;

/// A subscriber to events of one or more types.
///
/// Handlers receive the bus they were invoked from so they can publish
/// follow-up events (which are dispatched before `handle` returns).
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns a name for this handler, used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handles a single event.
    async fn handle(&self, bus: &EventBus, event: &Event) -> Result<(), HandlerError>;
}

/// Adapter that turns an async closure into an [`EventHandler`].
pub struct FnHandler<F> {
    name: String,
    f: F,
}

/// Wraps `f` so it can be passed to [`EventBus::subscribe`].
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> FnHandler<F>
where
    F: Fn(EventBus, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    FnHandler {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(EventBus, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, bus: &EventBus, event: &Event) -> Result<(), HandlerError> {
        (self.f)(bus.clone(), event.clone()).await
    }
}
