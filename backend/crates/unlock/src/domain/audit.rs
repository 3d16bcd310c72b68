//! Audit Port
//!
//! Outbound port for the platform's audit-log sink. Events are emitted
//! after the primary operation commits; a sink failure is logged and
//! never propagated.

use crate::error::UnlockResult;
use kernel::id::UserId;

/// What happened, for the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    OfflineTransactionIssued,
    CodeRedeemed,
}

impl AuditKind {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditKind::OfflineTransactionIssued => "offline_transaction_issued",
            AuditKind::CodeRedeemed => "code_redeemed",
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit trail entry
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub kind: AuditKind,
    pub actor: UserId,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, actor: UserId, details: serde_json::Value) -> Self {
        Self {
            kind,
            actor,
            details,
        }
    }
}

/// Audit sink trait
#[trait_variant::make(AuditSink: Send)]
pub trait LocalAuditSink {
    /// Record an event. Callers treat failures as non-fatal.
    async fn record(&self, event: &AuditEvent) -> UnlockResult<()>;
}
