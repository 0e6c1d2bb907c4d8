//! Per-saga deadline timer.

use std::time::Duration;

use common::OrderId;
use domain::EventData;
use event_bus::{Event, EventBus};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Source of timeout events.
pub const TIMER_SOURCE: &str = "timeout-timer";

/// How a deadline timer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The deadline passed and `order.timeout` was published.
    Fired,
    /// The timer was cancelled before the deadline.
    Cancelled,
    /// The deadline passed but publishing the timeout failed.
    Failed(String),
}

/// Schedules one `order.timeout` event per saga.
///
/// The timer does not look at saga state: it fires even if the order already
/// finished. The kitchen absorbs such late timeouts.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineTimer {
    delay: Duration,
}

impl DeadlineTimer {
    /// Deadline used when none is configured.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(30);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts the timer for the saga rooted at `root`.
    ///
    /// After the delay a timeout event is published as a child of `root`,
    /// carrying its subject, unless the returned handle is cancelled first.
    /// Dropping the handle does not cancel the timer.
    pub fn schedule(&self, bus: &EventBus, root: &Event) -> TimerHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let bus = bus.clone();
        let root = root.clone();
        let delay = self.delay;
        let order_id = root.order_id().cloned().unwrap_or_else(OrderId::unknown);

        metrics::counter!("saga_timeouts_scheduled_total").increment(1);
        tracing::debug!(%order_id, delay_ms = delay.as_millis() as u64, "deadline timer scheduled");

        let task_order_id = order_id.clone();
        let task = tokio::spawn(async move {
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);

            // A dropped sender disables the cancel branch; only an explicit
            // cancel stops the timer.
            tokio::select! {
                Ok(()) = cancel_rx => {
                    tracing::debug!(order_id = %task_order_id, "deadline timer cancelled");
                    return TimerOutcome::Cancelled;
                }
                () = &mut sleep => {}
            }

            tracing::info!(order_id = %task_order_id, "deadline expired, publishing order.timeout");
            let timeout = Event::child_of(&root, TIMER_SOURCE, EventData::order_timed_out());
            match bus.publish(timeout).await {
                Ok(()) => TimerOutcome::Fired,
                Err(e) => {
                    tracing::error!(order_id = %task_order_id, error = %e, "failed to publish timeout");
                    TimerOutcome::Failed(e.to_string())
                }
            }
        });

        TimerHandle {
            order_id,
            cancel: Some(cancel_tx),
            task,
        }
    }
}

impl Default for DeadlineTimer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

/// Handle to a scheduled deadline.
#[derive(Debug)]
pub struct TimerHandle {
    order_id: OrderId,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<TimerOutcome>,
}

impl TimerHandle {
    /// The order this deadline belongs to.
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Asks the timer not to fire.
    ///
    /// Best-effort: returns false if the timer already fired (or was already
    /// cancelled). A timeout may still be observed after a successful cancel
    /// if the deadline raced it.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Returns true once the timer task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the timer to fire or be cancelled.
    pub async fn outcome(self) -> Result<TimerOutcome> {
        Ok(self.task.await?)
    }
}
