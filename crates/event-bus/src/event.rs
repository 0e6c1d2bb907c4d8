use chrono::{DateTime, Utc};
use common::{EventId, OrderId, Subject};
use domain::{EventData, EventType};
use serde::{Deserialize, Serialize};

use crate::trace::TraceContext;

/// Envelope spec version emitted with every event.
pub const SPEC_VERSION: &str = "1.0";

/// Content type of the `data` field.
pub const DATA_CONTENT_TYPE: &str = "application/json";

/// An immutable domain event.
///
/// The event type is derived from the payload variant, so an event can never
/// carry a payload of the wrong shape for its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event.
    pub id: EventId,

    /// The participant that produced the event (e.g. "payment-service").
    pub source: String,

    /// When the event was created.
    pub time: DateTime<Utc>,

    /// Correlation key of the order this event belongs to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Causal trace token.
    #[serde(rename = "traceparent")]
    pub trace_context: TraceContext,

    /// The typed payload, serialized as `type` + `data`.
    #[serde(flatten)]
    pub data: EventData,

    #[serde(rename = "specversion")]
    pub spec_version: String,

    #[serde(rename = "datacontenttype")]
    pub data_content_type: String,
}

impl Event {
    /// Creates a new event builder for the given payload.
    pub fn builder(data: EventData) -> EventBuilder {
        EventBuilder::new(data)
    }

    /// Creates a child of `parent` that carries the parent's subject.
    pub fn child_of(parent: &Event, source: impl Into<String>, data: EventData) -> Self {
        let mut builder = Event::builder(data).source(source).parent(parent);
        if let Some(subject) = &parent.subject {
            builder = builder.subject(subject.clone());
        }
        builder.build()
    }

    /// Returns the event type, derived from the payload.
    pub fn event_type(&self) -> EventType {
        self.data.event_type()
    }

    /// Returns the order id from the subject, if the subject is present.
    pub fn order_id(&self) -> Option<&OrderId> {
        self.subject.as_ref().map(Subject::order_id)
    }

    /// Returns true if `other` belongs to the same causal chain.
    pub fn shares_trace_with(&self, other: &Event) -> bool {
        self.trace_context.trace_id() == other.trace_context.trace_id()
    }
}

/// Optional causal links for [`create_event`].
#[derive(Debug, Clone, Default)]
pub struct EventOptions<'a> {
    /// The event this one is a consequence of.
    pub parent: Option<&'a Event>,
    /// Correlation key to attach verbatim.
    pub subject: Option<Subject>,
}

/// Creates a uniquely identified event.
///
/// With a parent, the event continues the parent's trace under a fresh span.
/// Without one, a new trace is started. The subject is attached only when
/// given; an absent subject means "not yet correlated to an order".
pub fn create_event(data: EventData, source: impl Into<String>, options: EventOptions<'_>) -> Event {
    let mut builder = Event::builder(data).source(source);
    if let Some(parent) = options.parent {
        builder = builder.parent(parent);
    }
    if let Some(subject) = options.subject {
        builder = builder.subject(subject);
    }
    builder.build()
}

#[derive(Debug, Clone, Default)]
enum TraceOrigin {
    #[default]
    Fresh,
    Parent(TraceContext),
    Raw(String),
}

/// Builder for constructing events.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    data: EventData,
    source: Option<String>,
    subject: Option<Subject>,
    trace: TraceOrigin,
    time: Option<DateTime<Utc>>,
}

impl EventBuilder {
    fn new(data: EventData) -> Self {
        Self {
            data,
            source: None,
            subject: None,
            trace: TraceOrigin::Fresh,
            time: None,
        }
    }

    /// Sets the producing participant.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a correlation subject.
    pub fn subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Continues the trace of `parent`.
    pub fn parent(mut self, parent: &Event) -> Self {
        self.trace = TraceOrigin::Parent(parent.trace_context.clone());
        self
    }

    /// Continues a trace from a raw `traceparent` token received from outside
    /// the process. Malformed tokens start a new trace.
    pub fn traceparent(mut self, raw: impl Into<String>) -> Self {
        self.trace = TraceOrigin::Raw(raw.into());
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Builds the event with a fresh id.
    pub fn build(self) -> Event {
        let trace_context = match self.trace {
            TraceOrigin::Fresh => TraceContext::generate(),
            TraceOrigin::Parent(parent) => parent.child(),
            TraceOrigin::Raw(raw) => TraceContext::derive_child(&raw),
        };

        Event {
            id: EventId::new(),
            source: self.source.unwrap_or_else(|| "unknown".to_string()),
            time: self.time.unwrap_or_else(Utc::now),
            subject: self.subject,
            trace_context,
            data: self.data,
            spec_version: SPEC_VERSION.to_string(),
            data_content_type: DATA_CONTENT_TYPE.to_string(),
        }
    }
}
