//! Compensating actions and the services that carry them out.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::SagaError;
use crate::state::KitchenState;

/// An undo step for work a participant already confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationAction {
    /// Give the customer their money back.
    Refund,
    /// Release the ingredient reservation.
    ReleaseInventory,
}

impl CompensationAction {
    /// Returns the undo actions for the flags set on `state`.
    ///
    /// Chef assignment has nothing to undo.
    pub fn for_state(state: &KitchenState) -> Vec<CompensationAction> {
        let mut actions = Vec::new();
        if state.payment_received {
            actions.push(CompensationAction::Refund);
        }
        if state.inventory_received {
            actions.push(CompensationAction::ReleaseInventory);
        }
        actions
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationAction::Refund => "refund",
            CompensationAction::ReleaseInventory => "release_inventory",
        }
    }
}

impl std::fmt::Display for CompensationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for carrying out compensating actions.
#[async_trait]
pub trait Compensator: Send + Sync {
    /// Performs one undo action for an order.
    async fn compensate(
        &self,
        order_id: &OrderId,
        action: CompensationAction,
    ) -> Result<(), SagaError>;
}

/// Compensator that only reports what it would undo.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCompensator;

#[async_trait]
impl Compensator for LoggingCompensator {
    async fn compensate(
        &self,
        order_id: &OrderId,
        action: CompensationAction,
    ) -> Result<(), SagaError> {
        match action {
            CompensationAction::Refund => {
                tracing::warn!(%order_id, "would issue refund");
            }
            CompensationAction::ReleaseInventory => {
                tracing::warn!(%order_id, "would release inventory reservation");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    performed: Vec<(OrderId, CompensationAction)>,
    fail: bool,
}

/// In-memory compensator that remembers every action, for testing.
#[derive(Debug, Clone, Default)]
pub struct RecordingCompensator {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingCompensator {
    /// Creates a new recording compensator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the compensator to fail every subsequent action.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns every action performed so far, in order.
    pub fn performed(&self) -> Vec<(OrderId, CompensationAction)> {
        self.state.read().unwrap().performed.clone()
    }

    /// Returns the actions performed for one order.
    pub fn performed_for(&self, order_id: &OrderId) -> Vec<CompensationAction> {
        self.state
            .read()
            .unwrap()
            .performed
            .iter()
            .filter(|(id, _)| id == order_id)
            .map(|(_, action)| *action)
            .collect()
    }
}

#[async_trait]
impl Compensator for RecordingCompensator {
    async fn compensate(
        &self,
        order_id: &OrderId,
        action: CompensationAction,
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail {
            return Err(SagaError::Compensation {
                action,
                reason: "compensation service unavailable".to_string(),
            });
        }

        state.performed.push((order_id.clone(), action));
        Ok(())
    }
}
