//! Audit Sink Implementations
//!
//! The platform's audit-log storage is an external collaborator; this
//! adapter forwards events to it through the tracing pipeline.

use crate::domain::audit::{AuditEvent, AuditSink};
use crate::error::UnlockResult;

/// Tracing-backed audit sink
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> UnlockResult<()> {
        tracing::info!(
            target: "audit",
            kind = %event.kind,
            actor = %event.actor,
            details = %event.details,
            "Audit event"
        );
        Ok(())
    }
}
