//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use common::OrderId;
use event_bus::{Event, EventBus};
use saga::{DeadlineTimer, KitchenSaga, OrderRequest, TimerHandle, place_order};
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub bus: EventBus,
    pub kitchen: Arc<KitchenSaga>,
    pub timer: DeadlineTimer,
    timers: Mutex<HashMap<OrderId, TimerHandle>>,
    // Serializes the duplicate check and publish of new orders.
    placement: Mutex<()>,
}

impl AppState {
    pub fn new(bus: EventBus, kitchen: Arc<KitchenSaga>, timer: DeadlineTimer) -> Self {
        Self {
            bus,
            kitchen,
            timer,
            timers: Mutex::new(HashMap::new()),
            placement: Mutex::new(()),
        }
    }

    /// Publishes `order.created` for a new order id.
    ///
    /// Fails with a conflict if the id already has an `order.created` in the
    /// log. Concurrent placements are serialized, so at most one of several
    /// racing requests for the same id succeeds.
    pub async fn place_new_order(&self, request: OrderRequest) -> Result<Event, ApiError> {
        let _guard = self.placement.lock().await;
        if self.bus.find_order_created(&request.order_id).await.is_some() {
            return Err(ApiError::Conflict(format!(
                "Order {} already exists",
                request.order_id
            )));
        }
        Ok(place_order(&self.bus, request).await?)
    }

    /// Starts the deadline for the saga rooted at `root`.
    pub async fn start_deadline(&self, order_id: &OrderId, root: &Event) {
        let handle = self.timer.schedule(&self.bus, root);
        let mut timers = self.timers.lock().await;
        timers.retain(|_, h| !h.is_finished());
        if let Some(mut previous) = timers.insert(order_id.clone(), handle) {
            previous.cancel();
        }
    }

    /// Cancels the order's deadline once its saga has reached an outcome.
    ///
    /// Returns true if a pending deadline was cancelled.
    pub async fn settle_deadline(&self, order_id: &OrderId) -> bool {
        let terminal = self
            .kitchen
            .state(order_id)
            .await
            .is_some_and(|s| s.status.is_terminal());
        if !terminal {
            return false;
        }
        self.cancel_deadline(order_id).await
    }

    /// Cancels the order's deadline unconditionally.
    pub async fn cancel_deadline(&self, order_id: &OrderId) -> bool {
        match self.timers.lock().await.remove(order_id) {
            Some(mut handle) => {
                let cancelled = handle.cancel();
                tracing::debug!(%order_id, cancelled, "deadline released");
                cancelled
            }
            None => false,
        }
    }

    /// Cancels every pending deadline.
    pub async fn cancel_all_deadlines(&self) {
        for (_, mut handle) in self.timers.lock().await.drain() {
            handle.cancel();
        }
    }

    /// Returns the number of deadlines still pending.
    pub async fn pending_deadlines(&self) -> usize {
        self.timers
            .lock()
            .await
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }
}
