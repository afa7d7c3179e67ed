//! # Security Audit Log
//!
//! Cross-cutting sink for every security-relevant decision the pipeline
//! makes: quota denials, validation rejections, sandbox lifecycle events,
//! execution verdicts, and grading completion.
//!
//! Storage and transport of events are collaborator concerns; this crate
//! only defines the sink interface plus two implementations, a `log`-backed
//! default and an in-memory sink for tests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// One security-relevant event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Stable event type tag, e.g. "quota_denied" or "sandbox_created".
    pub event_type: String,
    /// Identity the event concerns (submitter id).
    pub identity: String,
    /// Free-form structured detail map.
    pub detail: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_type: &str, identity: &str, detail: serde_json::Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            identity: identity.to_string(),
            detail,
            timestamp: Utc::now(),
        }
    }
}

/// Sink for audit events. Implementations must be cheap and infallible;
/// auditing must never be able to fail a submission.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Default sink: emits each event through the `log` facade as a single
/// structured line.
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        log::info!(
            target: "audit",
            "{} identity={} detail={}",
            event.event_type,
            event.identity,
            event.detail
        );
    }
}

/// Test sink: retains every event in memory for later assertions.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in arrival order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink poisoned").clone()
    }

    /// Event types only, for terse assertions on pipeline flow.
    pub fn event_types(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().expect("audit sink poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_retains_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::new("quota_denied", "alice", json!({"used": 10})));
        sink.record(AuditEvent::new("sandbox_created", "bob", json!({})));

        assert_eq!(sink.event_types(), vec!["quota_denied", "sandbox_created"]);
        let events = sink.events();
        assert_eq!(events[0].identity, "alice");
        assert_eq!(events[0].detail["used"], 10);
    }
}
