//! # Audit Trail Abstraction
//!
//! Every pack state transition and every safeguard decision must land in
//! an append-only audit trail with actor, timestamp, and before/after
//! values. The engine does not own the trail's storage — it writes through
//! the [`AuditSink`] trait and deployments decide where entries go.
//!
//! [`TracingAuditSink`] emits structured `tracing` events under the
//! `audit` target, which production deployments route to a dedicated
//! appender. [`MemoryAuditSink`] collects entries for test assertions.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One append-only audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Who performed the action ("system" for engine-driven transitions).
    pub actor: String,
    /// Machine-readable action name (e.g. `pack.transition`,
    /// `safeguard.detail_downgrade`).
    pub action: String,
    /// The record the action applies to, as a display identifier.
    pub subject: String,
    /// When the action occurred.
    pub occurred_at: DateTime<Utc>,
    /// Value before the action, where meaningful.
    pub before: Option<String>,
    /// Value after the action, where meaningful.
    pub after: Option<String>,
    /// Free-text context (reason, justification reference).
    pub note: Option<String>,
}

impl AuditEvent {
    /// Build an event with the current timestamp.
    pub fn now(actor: impl Into<String>, action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            subject: subject.into(),
            occurred_at: Utc::now(),
            before: None,
            after: None,
            note: None,
        }
    }

    /// Attach a before value.
    pub fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    /// Attach an after value.
    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    /// Attach a free-text note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Destination for audit trail entries. Implementations must be
/// append-only: recorded events are never rewritten or dropped.
pub trait AuditSink: Send + Sync {
    /// Record one audit event.
    fn record(&self, event: AuditEvent);
}

/// Audit sink that emits structured `tracing` events under the `audit`
/// target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            actor = %event.actor,
            action = %event.action,
            subject = %event.subject,
            occurred_at = %event.occurred_at,
            before = event.before.as_deref().unwrap_or("-"),
            after = event.after.as_deref().unwrap_or("-"),
            note = event.note.as_deref().unwrap_or("-"),
            "audit"
        );
    }
}

/// In-memory audit sink for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in recording order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
