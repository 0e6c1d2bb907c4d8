//! Per-order saga state store.

use std::collections::HashMap;
use std::sync::Arc;

use common::OrderId;
use domain::EventData;
use tokio::sync::Mutex;

use crate::state::{KitchenState, Transition};

/// Store of kitchen states, keyed by order id.
///
/// Every read-modify-write of one order's state happens under a single lock,
/// so concurrent publishers cannot both move a saga out of `Waiting`.
/// Cloning the store is cheap; clones share the same states.
#[derive(Debug, Clone, Default)]
pub struct SagaStore {
    states: Arc<Mutex<HashMap<OrderId, KitchenState>>>,
}

impl SagaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event to an order's state, creating the state on first use.
    ///
    /// Returns the transition and a copy of the state after the update.
    pub async fn apply(&self, order_id: &OrderId, data: &EventData) -> (Transition, KitchenState) {
        let mut states = self.states.lock().await;
        let state = states
            .entry(order_id.clone())
            .or_insert_with(|| KitchenState::new(order_id.clone()));
        let transition = state.apply(data);
        (transition, state.clone())
    }

    /// Returns the current state of an order, if any event referenced it.
    pub async fn get(&self, order_id: &OrderId) -> Option<KitchenState> {
        self.states.lock().await.get(order_id).cloned()
    }

    /// Returns every recorded state, ordered by order id.
    pub async fn all(&self) -> Vec<KitchenState> {
        let mut states: Vec<_> = self.states.lock().await.values().cloned().collect();
        states.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        states
    }

    /// Forgets one order's state, or every state when `order_id` is `None`.
    pub async fn reset(&self, order_id: Option<&OrderId>) {
        let mut states = self.states.lock().await;
        match order_id {
            Some(id) => {
                states.remove(id);
            }
            None => states.clear(),
        }
    }

    /// Returns the number of tracked orders.
    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
