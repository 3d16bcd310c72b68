//! Domain Entities
//!
//! Core business entities for the unlock-code ledger.

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, EnrollmentId, TransactionId, UnlockCodeId, UserId};

use crate::domain::value_objects::{
    Amount, BuyerName, CodeDigest, PaymentMethod, TransactionStatus,
};

/// TransactionRecord entity - one manually-settled offline payment
///
/// A financial record: it is mutated only to attach the minted unlock
/// code and is never deleted.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub buyer_name: BuyerName,
    pub contact: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub course_id: CourseId,
    pub amount: Amount,
    pub notes: Option<String>,
    pub status: TransactionStatus,
    pub issued_by: UserId,
    pub unlock_code_id: Option<UnlockCodeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Record a new offline sale, pending its unlock code
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer_name: BuyerName,
        contact: String,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
        course_id: CourseId,
        amount: Amount,
        notes: Option<String>,
        issued_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            buyer_name,
            contact,
            payment_method,
            payment_reference,
            course_id,
            amount,
            notes,
            status: TransactionStatus::PendingRedemption,
            issued_by,
            unlock_code_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the minted code and complete the record
    pub fn attach_code(&mut self, code_id: UnlockCodeId) {
        self.unlock_code_id = Some(code_id);
        self.status = TransactionStatus::Completed;
        self.updated_at = Utc::now();
    }
}

/// UnlockCode entity - a single-use voucher bound to one transaction
/// and one course
#[derive(Debug, Clone)]
pub struct UnlockCode {
    pub id: UnlockCodeId,
    /// Display/audit only; the digest is the lookup key
    pub plain_code: String,
    pub code_digest: CodeDigest,
    pub course_id: CourseId,
    pub issued_to: String,
    pub issued_by: UserId,
    pub transaction_id: TransactionId,
    pub is_used: bool,
    pub redeemed_by: Option<UserId>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl UnlockCode {
    /// Mint a new unused code
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plain_code: String,
        code_digest: CodeDigest,
        course_id: CourseId,
        issued_to: String,
        issued_by: UserId,
        transaction_id: TransactionId,
        ttl_ms: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UnlockCodeId::new(),
            plain_code,
            code_digest,
            course_id,
            issued_to,
            issued_by,
            transaction_id,
            is_used: false,
            redeemed_by: None,
            redeemed_at: None,
            expires_at_ms: now.timestamp_millis() + ttl_ms,
            created_at: now,
        }
    }

    /// Check if the code has passed its validity window
    ///
    /// Expiry is soft: derived from the clock at read time, never a
    /// stored transition.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// Whether the code could currently be redeemed
    pub fn is_redeemable(&self) -> bool {
        !self.is_used && !self.is_expired()
    }

    /// Irreversibly consume the code for `student`
    pub fn mark_redeemed(&mut self, student: UserId) {
        self.is_used = true;
        self.redeemed_by = Some(student);
        self.redeemed_at = Some(Utc::now());
    }
}

/// Enrollment entity - the access grant created by a redemption
///
/// Append-only from this core's perspective. Progress tracking lives in
/// another subsystem.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(student_id: UserId, course_id: CourseId) -> Self {
        Self {
            id: EnrollmentId::new(),
            student_id,
            course_id,
            enrolled_at: Utc::now(),
        }
    }
}

/// Read model: the slice of a transaction shown next to its code
#[derive(Debug, Clone)]
pub struct TransactionSummary {
    pub transaction_id: TransactionId,
    pub buyer_name: BuyerName,
    pub amount: Amount,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
}

/// Read model: an unlock code joined with its owning transaction
#[derive(Debug, Clone)]
pub struct UnlockCodeWithTransaction {
    pub code: UnlockCode,
    pub transaction: TransactionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::code_digest;

    fn sample_code(ttl_ms: i64) -> UnlockCode {
        UnlockCode::new(
            "ABCD-1234".to_string(),
            code_digest("ABCD-1234"),
            CourseId::new(),
            "Asha".to_string(),
            UserId::new(),
            TransactionId::new(),
            ttl_ms,
        )
    }

    #[test]
    fn test_transaction_attach_code() {
        let mut record = TransactionRecord::new(
            BuyerName::new("Asha").unwrap(),
            "+8801700000000".to_string(),
            PaymentMethod::Cash,
            None,
            CourseId::new(),
            Amount::new(1000).unwrap(),
            None,
            UserId::new(),
        );
        assert_eq!(record.status, TransactionStatus::PendingRedemption);
        assert!(record.unlock_code_id.is_none());

        let code_id = UnlockCodeId::new();
        record.attach_code(code_id);
        assert_eq!(record.status, TransactionStatus::Completed);
        assert_eq!(record.unlock_code_id, Some(code_id));
    }

    #[test]
    fn test_unlock_code_fresh_is_redeemable() {
        let code = sample_code(7 * 24 * 3600 * 1000);
        assert!(!code.is_used);
        assert!(!code.is_expired());
        assert!(code.is_redeemable());
    }

    #[test]
    fn test_unlock_code_expiry() {
        let code = sample_code(-1);
        assert!(code.is_expired());
        assert!(!code.is_redeemable());
    }

    #[test]
    fn test_unlock_code_mark_redeemed() {
        let mut code = sample_code(60_000);
        let student = UserId::new();

        code.mark_redeemed(student);
        assert!(code.is_used);
        assert_eq!(code.redeemed_by, Some(student));
        assert!(code.redeemed_at.is_some());
        assert!(!code.is_redeemable());
    }

    #[test]
    fn test_enrollment_creation() {
        let student = UserId::new();
        let course = CourseId::new();
        let enrollment = Enrollment::new(student, course);
        assert_eq!(enrollment.student_id, student);
        assert_eq!(enrollment.course_id, course);
    }
}
