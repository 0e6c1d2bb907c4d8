//! Causal trace context (`version-traceId-spanId-flags`).
//!
//! All events of one saga share a trace id. Every event gets a fresh span id,
//! and a child keeps its parent's version, trace id and flags.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Version emitted for freshly generated contexts.
pub const TRACE_VERSION: &str = "00";

/// Flags emitted for freshly generated contexts (sampled).
pub const TRACE_FLAGS_SAMPLED: &str = "01";

/// A four-part causal trace token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceContext {
    version: String,
    trace_id: String,
    span_id: String,
    flags: String,
}

impl TraceContext {
    /// Generates a new root context with a random trace id and span id.
    pub fn generate() -> Self {
        Self {
            version: TRACE_VERSION.to_string(),
            trace_id: random_trace_id(),
            span_id: random_span_id(),
            flags: TRACE_FLAGS_SAMPLED.to_string(),
        }
    }

    /// Parses a `version-traceId-spanId-flags` token.
    ///
    /// Only the segment count is checked. Returns `None` unless there are
    /// exactly four dash-separated segments.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split('-').collect();
        match parts.as_slice() {
            [version, trace_id, span_id, flags] => Some(Self {
                version: (*version).to_string(),
                trace_id: (*trace_id).to_string(),
                span_id: (*span_id).to_string(),
                flags: (*flags).to_string(),
            }),
            _ => None,
        }
    }

    /// Returns a child of this context: same trace, fresh span.
    pub fn child(&self) -> Self {
        Self {
            version: self.version.clone(),
            trace_id: self.trace_id.clone(),
            span_id: random_span_id(),
            flags: self.flags.clone(),
        }
    }

    /// Derives a child from a raw parent token.
    ///
    /// A malformed parent yields a fresh root context instead of an error.
    pub fn derive_child(raw_parent: &str) -> Self {
        match Self::parse(raw_parent) {
            Some(parent) => parent.child(),
            None => {
                tracing::debug!(
                    traceparent = raw_parent,
                    "malformed parent trace, starting new trace"
                );
                Self::generate()
            }
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl std::fmt::Display for TraceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.version, self.trace_id, self.span_id, self.flags
        )
    }
}

impl Serialize for TraceContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TraceContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TraceContext::parse(&raw).unwrap_or_else(TraceContext::generate))
    }
}

// 32 hex chars from a v4 UUID (OS randomness).
fn random_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// 16 hex chars taken from the low half of a v4 UUID.
fn random_span_id() -> String {
    format!("{:016x}", Uuid::new_v4().as_u128() as u64)
}
