//! Redeem Code Use Case
//!
//! The redemption state machine: validate the submitted code, consume
//! it exactly once, and materialize the enrollment.

use crate::domain::audit::{AuditEvent, AuditKind, AuditSink};
use crate::domain::entities::{Enrollment, UnlockCode};
use crate::domain::repository::{
    CourseCatalog, EnrollmentRepository, RedemptionRepository, TransactionRepository,
    UnlockCodeRepository,
};
use crate::domain::services::{code_digest, normalize_code};
use crate::error::{UnlockError, UnlockResult};
use kernel::id::{CourseId, UserId};
use std::sync::Arc;

/// Input DTO for redemption
#[derive(Debug, Clone)]
pub struct RedeemCodeInput {
    pub plain_code: String,
    pub course_id: CourseId,
}

/// Output DTO for redemption
#[derive(Debug, Clone)]
pub struct RedeemCodeOutput {
    pub enrollment: Enrollment,
}

/// Redeem Code Use Case
pub struct RedeemCodeUseCase<C, R, E, T, G, A>
where
    C: UnlockCodeRepository,
    R: RedemptionRepository,
    E: EnrollmentRepository,
    T: TransactionRepository,
    G: CourseCatalog,
    A: AuditSink,
{
    code_repo: Arc<C>,
    redemption_repo: Arc<R>,
    enrollment_repo: Arc<E>,
    transaction_repo: Arc<T>,
    catalog: Arc<G>,
    audit: Arc<A>,
}

impl<C, R, E, T, G, A> RedeemCodeUseCase<C, R, E, T, G, A>
where
    C: UnlockCodeRepository,
    R: RedemptionRepository,
    E: EnrollmentRepository,
    T: TransactionRepository,
    G: CourseCatalog,
    A: AuditSink,
{
    pub fn new(
        code_repo: Arc<C>,
        redemption_repo: Arc<R>,
        enrollment_repo: Arc<E>,
        transaction_repo: Arc<T>,
        catalog: Arc<G>,
        audit: Arc<A>,
    ) -> Self {
        Self {
            code_repo,
            redemption_repo,
            enrollment_repo,
            transaction_repo,
            catalog,
            audit,
        }
    }

    pub async fn execute(
        &self,
        input: RedeemCodeInput,
        student: UserId,
    ) -> UnlockResult<RedeemCodeOutput> {
        if normalize_code(&input.plain_code).is_empty() {
            return Err(UnlockError::Validation(
                "unlock code cannot be empty".to_string(),
            ));
        }

        // The digest is computed over the same normalized form used at
        // mint time; the course must match the one the code was minted
        // for, so a code for course A never unlocks course B.
        let digest = code_digest(&input.plain_code);
        let code = self
            .code_repo
            .find_by_digest_for_course(&digest, &input.course_id)
            .await?
            .ok_or(UnlockError::CodeNotFoundForCourse)?;

        if code.is_used {
            return Err(UnlockError::CodeAlreadyRedeemed);
        }
        if code.is_expired() {
            return Err(UnlockError::CodeExpired);
        }
        if self
            .enrollment_repo
            .is_enrolled(&student, &input.course_id)
            .await?
        {
            return Err(UnlockError::AlreadyEnrolled);
        }

        // Exactly-once consumption: the repository flips is_used with a
        // conditional write and creates the enrollment in the same
        // storage transaction. Concurrent attempts on the same code lose
        // here with CodeAlreadyRedeemed or AlreadyEnrolled.
        let enrollment = self
            .redemption_repo
            .consume_and_enroll(&code.id, &student, &input.course_id)
            .await?;

        // Denormalized counter; eventual consistency is acceptable.
        if let Err(e) = self.catalog.increment_enrolled_count(&input.course_id).await {
            tracing::warn!(
                error = %e,
                course_id = %input.course_id,
                "Enrolled-count increment failed"
            );
        }

        tracing::info!(
            unlock_code_id = %code.id,
            course_id = %input.course_id,
            student_id = %student,
            "Unlock code redeemed"
        );

        self.emit_audit(&code, &enrollment).await;

        Ok(RedeemCodeOutput { enrollment })
    }

    async fn emit_audit(&self, code: &UnlockCode, enrollment: &Enrollment) {
        let amount_minor = match self.transaction_repo.find_by_id(&code.transaction_id).await {
            Ok(Some(record)) => Some(record.amount.minor_units()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Transaction lookup for audit failed");
                None
            }
        };

        let event = AuditEvent::new(
            AuditKind::CodeRedeemed,
            enrollment.student_id,
            serde_json::json!({
                "unlockCodeId": code.id.to_string(),
                "plainCode": code.plain_code,
                "transactionId": code.transaction_id.to_string(),
                "courseId": enrollment.course_id.to_string(),
                "studentId": enrollment.student_id.to_string(),
                "amountMinor": amount_minor,
            }),
        );

        if let Err(e) = self.audit.record(&event).await {
            tracing::warn!(error = %e, "Audit sink failed for redemption");
        }
    }
}
