use common::{OrderId, Subject};
use domain::EventType;

use crate::event::Event;

/// Predicate over the event log.
///
/// Allows filtering events by subject, order id, event type and source.
/// Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Filter by exact subject.
    pub subject: Option<Subject>,

    /// Filter by the order id carried in the subject.
    pub order_id: Option<OrderId>,

    /// Filter by event types (any of these types).
    pub event_types: Option<Vec<EventType>>,

    /// Filter by producing participant.
    pub source: Option<String>,

    /// Maximum number of events to return.
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for all events of one order subject.
    pub fn for_subject(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
            ..Default::default()
        }
    }

    /// Creates a query for all events whose subject names this order.
    pub fn for_order(order_id: OrderId) -> Self {
        Self {
            order_id: Some(order_id),
            ..Default::default()
        }
    }

    /// Creates a query for events of a specific type.
    pub fn for_event_type(event_type: EventType) -> Self {
        Self {
            event_types: Some(vec![event_type]),
            ..Default::default()
        }
    }

    /// Filters by subject.
    pub fn subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Filters by order id.
    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Filters by event type.
    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_types = Some(vec![event_type]);
        self
    }

    /// Filters by multiple event types (any of these).
    pub fn event_types(mut self, event_types: Vec<EventType>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    /// Filters by source.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Limits the number of events returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `event` satisfies every criterion set on this query.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref subject) = self.subject
            && event.subject.as_ref() != Some(subject)
        {
            return false;
        }
        if let Some(ref order_id) = self.order_id
            && event.order_id() != Some(order_id)
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&event.event_type())
        {
            return false;
        }
        if let Some(ref source) = self.source
            && &event.source != source
        {
            return false;
        }
        true
    }

    /// Applies the query to a log, keeping publish order.
    pub fn apply<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Vec<Event> {
        let matching = events.into_iter().filter(|e| self.matches(e)).cloned();
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
