//! Kitchen saga aggregator.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use event_bus::{Event, EventBus, EventHandler, EventType, HandlerError, SubscriptionId};

use crate::compensation::{CompensationAction, Compensator, LoggingCompensator};
use crate::state::{KitchenState, Transition};
use crate::store::SagaStore;

/// Event types the kitchen listens to.
pub const KITCHEN_EVENTS: [EventType; 7] = [
    EventType::PaymentCompleted,
    EventType::InventoryReserved,
    EventType::ChefAssigned,
    EventType::PaymentFailed,
    EventType::InventoryFailed,
    EventType::ChefUnavailable,
    EventType::OrderTimeout,
];

/// Aggregates participant events into a per-order outcome.
///
/// The kitchen waits for payment, inventory and chef confirmations. The first
/// failure or timeout wins and triggers compensation for the work already
/// confirmed; anything arriving after a terminal outcome is absorbed.
pub struct KitchenSaga {
    store: SagaStore,
    compensator: Arc<dyn Compensator>,
}

impl KitchenSaga {
    /// Creates a kitchen backed by `store` that undoes work with `compensator`.
    pub fn new(store: SagaStore, compensator: Arc<dyn Compensator>) -> Self {
        Self { store, compensator }
    }

    /// Subscribes the kitchen to every event type it aggregates.
    pub async fn register(self: &Arc<Self>, bus: &EventBus) -> Vec<SubscriptionId> {
        let handler: Arc<dyn EventHandler> = self.clone();
        let mut ids = Vec::with_capacity(KITCHEN_EVENTS.len());
        for event_type in KITCHEN_EVENTS {
            ids.push(bus.subscribe_shared(event_type, handler.clone()).await);
        }
        ids
    }

    /// Returns the current state of an order, or `None` if nothing was recorded.
    pub async fn state(&self, order_id: &OrderId) -> Option<KitchenState> {
        self.store.get(order_id).await
    }

    /// Returns every recorded state.
    pub async fn states(&self) -> Vec<KitchenState> {
        self.store.all().await
    }

    /// Clears one order's state, or all states when `order_id` is `None`.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self, order_id: Option<&OrderId>) {
        self.store.reset(order_id).await;
        tracing::info!("kitchen state reset");
    }

    // Compensation is best-effort: a failing action is logged and the rest
    // still run.
    async fn compensate(&self, order_id: &OrderId, actions: &[CompensationAction]) {
        for &action in actions {
            match self.compensator.compensate(order_id, action).await {
                Ok(()) => {
                    metrics::counter!("saga_compensations_total", "action" => action.as_str())
                        .increment(1);
                }
                Err(e) => {
                    metrics::counter!("saga_compensation_failures_total").increment(1);
                    tracing::error!(%order_id, %action, error = %e, "compensation failed");
                }
            }
        }
    }
}

impl Default for KitchenSaga {
    fn default() -> Self {
        Self::new(SagaStore::new(), Arc::new(LoggingCompensator))
    }
}

#[async_trait]
impl EventHandler for KitchenSaga {
    fn name(&self) -> &str {
        "kitchen"
    }

    #[tracing::instrument(
        skip_all,
        fields(event_type = %event.event_type(), order_id = tracing::field::Empty)
    )]
    async fn handle(&self, _bus: &EventBus, event: &Event) -> Result<(), HandlerError> {
        let order_id = event.order_id().cloned().unwrap_or_else(OrderId::unknown);
        tracing::Span::current().record("order_id", tracing::field::display(&order_id));
        if order_id.is_unknown() {
            tracing::warn!(event_id = %event.id, "event has no order subject, using placeholder");
        }

        let (transition, state) = self.store.apply(&order_id, &event.data).await;

        match transition {
            Transition::Unchanged => {}
            Transition::Progressed => {
                tracing::info!(
                    payment = state.payment_received,
                    inventory = state.inventory_received,
                    chef = state.chef_received,
                    "kitchen state updated"
                );
            }
            Transition::Ready => {
                metrics::counter!("saga_transitions_total", "status" => "ready").increment(1);
                tracing::info!("order is ready, all events received");
            }
            Transition::Terminated {
                status,
                compensations,
            } => {
                metrics::counter!("saga_transitions_total", "status" => status.as_str())
                    .increment(1);
                tracing::warn!(
                    %status,
                    reason = state.failure_reason.as_deref().unwrap_or_default(),
                    compensations = compensations.len(),
                    "order did not complete, rolling back where needed"
                );
                self.compensate(&order_id, &compensations).await;
            }
            Transition::AlreadyTerminal(status) => {
                tracing::debug!(%status, "saga already terminal, event absorbed");
            }
        }

        Ok(())
    }
}
