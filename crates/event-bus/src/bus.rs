//! The in-process publish/subscribe bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::OrderId;
use domain::EventType;
use tokio::sync::RwLock;

use crate::error::{BusError, Result};
use crate::event::Event;
use crate::handler::EventHandler;
use crate::query::EventQuery;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    event_type: EventType,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct BusInner {
    subscriptions: RwLock<Vec<Subscription>>,
    events: RwLock<Vec<Event>>,
    next_subscription: AtomicU64,
}

/// In-memory event bus.
///
/// Cloning the bus is cheap; all clones share the same subscriptions and
/// event log.
///
/// Dispatch rules:
/// - every published event is appended to the log, even if nobody listens
/// - handlers for the event's type run one at a time, in subscription order
/// - `publish` returns once every handler has finished, or with the first
///   handler error (remaining handlers are skipped, earlier ones are not
///   undone)
///
/// Handlers are never awaited while a bus lock is held, so a handler may
/// publish follow-up events on the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates a new bus with no subscriptions and an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of `event_type`.
    pub async fn subscribe<H>(&self, event_type: EventType, handler: H) -> SubscriptionId
    where
        H: EventHandler + 'static,
    {
        self.subscribe_shared(event_type, Arc::new(handler)).await
    }

    /// Registers an already shared handler, so one handler instance can
    /// serve several event types.
    pub async fn subscribe_shared(
        &self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %event_type, handler = handler.name(), "handler subscribed");
        self.inner.subscriptions.write().await.push(Subscription {
            id,
            event_type,
            handler,
        });
        id
    }

    /// Removes a subscription. Returns false if it was not registered.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.inner.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Returns the number of active subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().await.len()
    }

    /// Records `event` in the log and dispatches it to its subscribers.
    #[tracing::instrument(
        skip(self, event),
        fields(event_type = %event.event_type(), event_id = %event.id)
    )]
    pub async fn publish(&self, event: Event) -> Result<()> {
        let started = std::time::Instant::now();
        let event_type = event.event_type();

        self.inner.events.write().await.push(event.clone());
        metrics::counter!("bus_events_published_total", "event_type" => event_type.as_str())
            .increment(1);
        tracing::debug!(
            source = %event.source,
            subject = event.subject.as_ref().map(|s| s.to_string()),
            traceparent = %event.trace_context,
            "event published"
        );

        let result = self.dispatch(&event).await;
        metrics::histogram!("bus_publish_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    // Runs the subscribers of `event` in subscription order, stopping at the
    // first failure. No lock is held while a handler runs.
    async fn dispatch(&self, event: &Event) -> Result<()> {
        let event_type = event.event_type();
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .inner
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.event_type == event_type)
            .map(|s| s.handler.clone())
            .collect();

        for handler in handlers {
            if let Err(source) = handler.handle(self, event).await {
                metrics::counter!("bus_handler_failures_total").increment(1);
                tracing::warn!(handler = handler.name(), error = %source, "event handler failed");
                return Err(BusError::Handler {
                    event_type,
                    event_id: event.id,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Returns the full event log in publish order.
    pub async fn events(&self) -> Vec<Event> {
        self.inner.events.read().await.clone()
    }

    /// Returns the events matching `query`, in publish order.
    pub async fn query(&self, query: &EventQuery) -> Vec<Event> {
        query.apply(self.inner.events.read().await.iter())
    }

    /// Returns the total number of events published.
    pub async fn event_count(&self) -> usize {
        self.inner.events.read().await.len()
    }

    /// Finds the `order.created` event that started the given order, if any.
    pub async fn find_order_created(&self, order_id: &OrderId) -> Option<Event> {
        self.inner
            .events
            .read()
            .await
            .iter()
            .find(|e| e.event_type() == EventType::OrderCreated && e.order_id() == Some(order_id))
            .cloned()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
