//! Issue Offline Transaction Use Case
//!
//! An admin records a manually-settled payment; the system mints the
//! single-use unlock code bound to it.

use crate::application::config::UnlockConfig;
use crate::domain::audit::{AuditEvent, AuditKind, AuditSink};
use crate::domain::entities::{TransactionRecord, UnlockCode};
use crate::domain::repository::{CourseCatalog, TransactionRepository, UnlockCodeRepository};
use crate::domain::services::{code_digest, generate_plain_code};
use crate::domain::value_objects::{Amount, BuyerName, CourseSummary, PaymentMethod};
use crate::error::{UnlockError, UnlockResult};
use kernel::id::{CourseId, UserId};
use std::sync::Arc;

/// Input DTO for issuing a transaction
#[derive(Debug, Clone)]
pub struct IssueTransactionInput {
    pub buyer_name: String,
    pub contact: String,
    pub payment_method: PaymentMethod,
    pub course_id: CourseId,
    pub amount_minor: i64,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

/// Output DTO for issuing a transaction
#[derive(Debug, Clone)]
pub struct IssueTransactionOutput {
    pub transaction: TransactionRecord,
    pub plain_code: String,
    pub expires_at_ms: i64,
}

/// Issue Offline Transaction Use Case
pub struct IssueTransactionUseCase<T, C, G, A>
where
    T: TransactionRepository,
    C: UnlockCodeRepository,
    G: CourseCatalog,
    A: AuditSink,
{
    transaction_repo: Arc<T>,
    code_repo: Arc<C>,
    catalog: Arc<G>,
    audit: Arc<A>,
    config: Arc<UnlockConfig>,
}

impl<T, C, G, A> IssueTransactionUseCase<T, C, G, A>
where
    T: TransactionRepository,
    C: UnlockCodeRepository,
    G: CourseCatalog,
    A: AuditSink,
{
    pub fn new(
        transaction_repo: Arc<T>,
        code_repo: Arc<C>,
        catalog: Arc<G>,
        audit: Arc<A>,
        config: Arc<UnlockConfig>,
    ) -> Self {
        Self {
            transaction_repo,
            code_repo,
            catalog,
            audit,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: IssueTransactionInput,
        issuer: UserId,
    ) -> UnlockResult<IssueTransactionOutput> {
        let buyer_name = BuyerName::new(input.buyer_name)?;
        let amount = Amount::new(input.amount_minor)?;

        let course = self
            .catalog
            .find_course(&input.course_id)
            .await?
            .ok_or(UnlockError::CourseNotFound)?;

        // The record is persisted before minting; a failed mint leaves it
        // in pending_redemption as the recoverable marker.
        let mut record = TransactionRecord::new(
            buyer_name,
            input.contact,
            input.payment_method,
            input.payment_reference,
            input.course_id,
            amount,
            input.notes,
            issuer,
        );
        self.transaction_repo.create(&record).await?;

        let code = self.mint_code(&record).await?;

        // A failure past this point leaves an orphaned-but-valid code;
        // the transaction is reconciled manually, never auto-retried.
        self.transaction_repo
            .attach_code(&record.id, &code.id)
            .await?;
        record.attach_code(code.id);

        tracing::info!(
            transaction_id = %record.id,
            course_id = %record.course_id,
            amount_minor = record.amount.minor_units(),
            "Offline transaction issued"
        );

        self.emit_audit(&record, &code, &course).await;

        Ok(IssueTransactionOutput {
            transaction: record,
            plain_code: code.plain_code,
            expires_at_ms: code.expires_at_ms,
        })
    }

    /// Mint a code, retrying on digest collisions up to the budget
    async fn mint_code(&self, record: &TransactionRecord) -> UnlockResult<UnlockCode> {
        for attempt in 1..=self.config.max_mint_attempts {
            let plain = generate_plain_code(self.config.code_group_count, self.config.code_group_len);
            let code = UnlockCode::new(
                plain.clone(),
                code_digest(&plain),
                record.course_id,
                record.buyer_name.as_str().to_string(),
                record.issued_by,
                record.id,
                self.config.code_ttl_ms(),
            );

            match self.code_repo.create(&code).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Unlock code minted after digest collisions");
                    }
                    return Ok(code);
                }
                Err(UnlockError::DuplicateDigest) => {
                    tracing::warn!(attempt, "Unlock code digest collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(UnlockError::CodeGenerationExhausted)
    }

    async fn emit_audit(&self, record: &TransactionRecord, code: &UnlockCode, course: &CourseSummary) {
        let event = AuditEvent::new(
            AuditKind::OfflineTransactionIssued,
            record.issued_by,
            serde_json::json!({
                "transactionId": record.id.to_string(),
                "courseId": record.course_id.to_string(),
                "courseTitle": course.title,
                "amountMinor": record.amount.minor_units(),
                "paymentMethod": record.payment_method.code(),
                "buyerName": record.buyer_name.as_str(),
                "plainCode": code.plain_code,
            }),
        );

        if let Err(e) = self.audit.record(&event).await {
            tracing::warn!(error = %e, "Audit sink failed for issued transaction");
        }
    }
}
