//! Structured audit events and the external append-only sink.
//!
//! The core emits exactly one event per successful mutating operation; it
//! never owns event storage. A failing sink is logged and alarmed but must
//! never roll back or block the underlying financial mutation.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ActorRef, Result};

/// One structured audit event: who did what to which resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: ActorRef,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    #[must_use]
    pub fn new(
        actor: ActorRef,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            actor,
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            before: None,
            after: None,
            at: now,
        }
    }

    #[must_use]
    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(before);
        self
    }

    #[must_use]
    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(after);
        self
    }
}

/// The external append-only audit sink.
pub trait AuditSink: Send + Sync {
    /// Append one event. Implementations must not reorder or drop events
    /// silently; a failure is surfaced as an error.
    fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Hand an event to the sink. Sink failures are logged at `warn` and
/// swallowed — audit emission never blocks the financial mutation.
pub fn emit(sink: &dyn AuditSink, event: AuditEvent) {
    let action = event.action.clone();
    let resource = event.resource_id.clone();
    if let Err(err) = sink.record(event) {
        tracing::warn!(%err, %action, %resource, "audit emission failed; mutation unaffected");
    }
}

/// In-memory sink for tests and embedded use.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrustHoldError;

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn record(&self, _event: AuditEvent) -> Result<()> {
            Err(TrustHoldError::AuditEmitFailed("sink down".into()))
        }
    }

    fn event() -> AuditEvent {
        AuditEvent::new(ActorRef::system(), "order_created", "order", "o-1", Utc::now())
    }

    #[test]
    fn memory_sink_appends_in_order() {
        let sink = MemoryAuditSink::new();
        sink.record(event()).unwrap();
        let mut second = event();
        second.action = "funds_released".to_string();
        sink.record(second).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, "order_created");
        assert_eq!(events[1].action, "funds_released");
    }

    #[test]
    fn emit_swallows_sink_failure() {
        // Must not panic or propagate.
        emit(&FailingSink, event());
    }

    #[test]
    fn snapshots_are_json() {
        let ev = event()
            .with_before(serde_json::json!({"status": "HELD"}))
            .with_after(serde_json::json!({"status": "RELEASED"}));
        assert_eq!(ev.before.unwrap()["status"], "HELD");
        assert_eq!(ev.after.unwrap()["status"], "RELEASED");
    }
}
