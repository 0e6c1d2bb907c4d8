//! Kitchen saga state machine.

use common::OrderId;
use domain::EventData;
use serde::{Deserialize, Serialize};

use crate::compensation::CompensationAction;

/// Reason recorded when the deadline expires.
pub const TIMEOUT_REASON: &str = "timeout waiting for all events";

/// The status of an order's saga.
///
/// State transitions:
/// ```text
/// Waiting ──┬──► Ready
///           ├──► Failed
///           └──► Timeout
/// ```
/// All three outcomes are terminal; nothing leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SagaStatus {
    /// Still collecting readiness signals.
    #[default]
    Waiting,

    /// Payment, inventory and chef all confirmed (terminal state).
    Ready,

    /// A participant reported a failure (terminal state).
    Failed,

    /// The deadline expired first (terminal state).
    Timeout,
}

impl SagaStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SagaStatus::Waiting)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Waiting => "waiting",
            SagaStatus::Ready => "ready",
            SagaStatus::Failed => "failed",
            SagaStatus::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What applying one event did to a saga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The event does not concern the kitchen.
    Unchanged,

    /// A readiness flag was recorded; the saga is still waiting.
    Progressed,

    /// The last missing signal arrived; the saga is now ready.
    Ready,

    /// The saga failed or timed out. Carries the undo actions for the work
    /// already confirmed at that moment.
    Terminated {
        status: SagaStatus,
        compensations: Vec<CompensationAction>,
    },

    /// The saga was already terminal; flags were recorded but nothing fired.
    AlreadyTerminal(SagaStatus),
}

/// Per-order kitchen state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenState {
    pub order_id: OrderId,
    pub payment_received: bool,
    pub inventory_received: bool,
    pub chef_received: bool,
    pub status: SagaStatus,
    /// Why the saga failed or timed out, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Undo actions taken at the terminal failure.
    #[serde(default)]
    pub compensations: Vec<CompensationAction>,
}

impl KitchenState {
    /// Creates a fresh waiting state for an order.
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            payment_received: false,
            inventory_received: false,
            chef_received: false,
            status: SagaStatus::Waiting,
            failure_reason: None,
            compensations: Vec::new(),
        }
    }

    /// Returns true once payment, inventory and chef have all confirmed.
    pub fn all_received(&self) -> bool {
        self.payment_received && self.inventory_received && self.chef_received
    }

    /// Applies an event to the state.
    ///
    /// Flags are always recorded. Status only ever moves out of `Waiting`,
    /// and only once.
    pub fn apply(&mut self, data: &EventData) -> Transition {
        match data {
            EventData::PaymentCompleted(_) => {
                self.payment_received = true;
                self.evaluate_readiness()
            }
            EventData::InventoryReserved(_) => {
                self.inventory_received = true;
                self.evaluate_readiness()
            }
            EventData::ChefAssigned(_) => {
                self.chef_received = true;
                self.evaluate_readiness()
            }
            EventData::PaymentFailed(failure) => {
                self.terminate(SagaStatus::Failed, format!("payment failed: {}", failure.reason))
            }
            EventData::InventoryFailed(failure) => self.terminate(
                SagaStatus::Failed,
                format!("inventory failed: {}", failure.reason),
            ),
            EventData::ChefUnavailable(failure) => self.terminate(
                SagaStatus::Failed,
                format!("chef unavailable: {}", failure.reason),
            ),
            EventData::OrderTimedOut(_) => {
                self.terminate(SagaStatus::Timeout, TIMEOUT_REASON.to_string())
            }
            EventData::OrderCreated(_) => Transition::Unchanged,
        }
    }

    // Flags can arrive in any order, so this runs after every flag update.
    fn evaluate_readiness(&mut self) -> Transition {
        if self.status.is_terminal() {
            return Transition::AlreadyTerminal(self.status);
        }
        if self.all_received() {
            self.status = SagaStatus::Ready;
            Transition::Ready
        } else {
            Transition::Progressed
        }
    }

    fn terminate(&mut self, status: SagaStatus, reason: String) -> Transition {
        if self.status.is_terminal() {
            return Transition::AlreadyTerminal(self.status);
        }
        let compensations = CompensationAction::for_state(self);
        self.status = status;
        self.failure_reason = Some(reason);
        self.compensations = compensations.clone();
        Transition::Terminated {
            status,
            compensations,
        }
    }
}
