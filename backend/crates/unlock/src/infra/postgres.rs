//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    Enrollment, TransactionRecord, TransactionSummary, UnlockCode, UnlockCodeWithTransaction,
};
use crate::domain::repository::{
    CourseCatalog, EnrollmentRepository, RedemptionRepository, TransactionRepository,
    UnlockCodeRepository,
};
use crate::domain::services;
use crate::domain::value_objects::{
    Amount, BuyerName, CodeDigest, CourseSummary, PaymentMethod, TransactionStatus,
};
use crate::error::{UnlockError, UnlockResult};
use kernel::id::{CourseId, TransactionId, UnlockCodeId, UserId};
use kernel::page::PageRequest;

/// PostgreSQL-backed ledger repository
#[derive(Clone)]
pub struct PgUnlockRepository {
    pool: PgPool,
}

impl PgUnlockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One-time migration: compute digests for legacy rows that predate
    /// hashed lookups. Replaces the old plaintext-lookup fallback.
    pub async fn backfill_missing_digests(&self) -> UnlockResult<u64> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT unlock_code_id, plain_code FROM unlock_codes WHERE code_digest IS NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut filled = 0u64;
        for (unlock_code_id, plain_code) in rows {
            let digest = services::code_digest(&plain_code);

            let result = sqlx::query(
                r#"
                UPDATE unlock_codes
                SET code_digest = $2
                WHERE unlock_code_id = $1 AND code_digest IS NULL
                "#,
            )
            .bind(unlock_code_id)
            .bind(digest.as_bytes())
            .execute(&self.pool)
            .await;

            match result {
                Ok(r) => filled += r.rows_affected(),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tracing::error!(
                        unlock_code_id = %unlock_code_id,
                        "Digest backfill collision, row left for manual review"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        if filled > 0 {
            tracing::info!(codes_backfilled = filled, "Backfilled legacy unlock code digests");
        }

        Ok(filled)
    }
}

impl TransactionRepository for PgUnlockRepository {
    async fn create(&self, record: &TransactionRecord) -> UnlockResult<()> {
        sqlx::query(
            r#"
            INSERT INTO unlock_transactions (
                transaction_id,
                buyer_name,
                contact,
                payment_method,
                payment_reference,
                course_id,
                amount_minor,
                notes,
                status,
                issued_by,
                unlock_code_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.buyer_name.as_str())
        .bind(&record.contact)
        .bind(record.payment_method.id())
        .bind(record.payment_reference.as_deref())
        .bind(record.course_id.as_uuid())
        .bind(record.amount.minor_units())
        .bind(record.notes.as_deref())
        .bind(record.status.id())
        .bind(record.issued_by.as_uuid())
        .bind(record.unlock_code_id.map(|id| id.into_uuid()))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            transaction_id = %record.id,
            course_id = %record.course_id,
            "Offline transaction created"
        );

        Ok(())
    }

    async fn find_by_id(&self, id: &TransactionId) -> UnlockResult<Option<TransactionRecord>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                transaction_id,
                buyer_name,
                contact,
                payment_method,
                payment_reference,
                course_id,
                amount_minor,
                notes,
                status,
                issued_by,
                unlock_code_id,
                created_at,
                updated_at
            FROM unlock_transactions
            WHERE transaction_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TransactionRow::into_record))
    }

    async fn attach_code(
        &self,
        id: &TransactionId,
        code_id: &UnlockCodeId,
    ) -> UnlockResult<()> {
        sqlx::query(
            r#"
            UPDATE unlock_transactions
            SET unlock_code_id = $2, status = $3, updated_at = $4
            WHERE transaction_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(code_id.as_uuid())
        .bind(TransactionStatus::Completed.id())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, page: &PageRequest) -> UnlockResult<(Vec<TransactionRecord>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM unlock_transactions")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                transaction_id,
                buyer_name,
                contact,
                payment_method,
                payment_reference,
                course_id,
                amount_minor,
                notes,
                status,
                issued_by,
                unlock_code_id,
                created_at,
                updated_at
            FROM unlock_transactions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let records = rows.into_iter().map(TransactionRow::into_record).collect();
        Ok((records, total as u64))
    }
}

impl UnlockCodeRepository for PgUnlockRepository {
    async fn create(&self, code: &UnlockCode) -> UnlockResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO unlock_codes (
                unlock_code_id,
                plain_code,
                code_digest,
                course_id,
                issued_to,
                issued_by,
                transaction_id,
                is_used,
                redeemed_by,
                redeemed_at,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(code.id.as_uuid())
        .bind(&code.plain_code)
        .bind(code.code_digest.as_bytes())
        .bind(code.course_id.as_uuid())
        .bind(&code.issued_to)
        .bind(code.issued_by.as_uuid())
        .bind(code.transaction_id.as_uuid())
        .bind(code.is_used)
        .bind(code.redeemed_by.map(|id| id.into_uuid()))
        .bind(code.redeemed_at)
        .bind(code.expires_at_ms)
        .bind(code.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(
                    unlock_code_id = %code.id,
                    transaction_id = %code.transaction_id,
                    "Unlock code created"
                );
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(UnlockError::DuplicateDigest)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_digest_for_course(
        &self,
        digest: &CodeDigest,
        course_id: &CourseId,
    ) -> UnlockResult<Option<UnlockCode>> {
        let row = sqlx::query_as::<_, UnlockCodeRow>(
            r#"
            SELECT
                unlock_code_id,
                plain_code,
                code_digest,
                course_id,
                issued_to,
                issued_by,
                transaction_id,
                is_used,
                redeemed_by,
                redeemed_at,
                expires_at_ms,
                created_at
            FROM unlock_codes
            WHERE code_digest = $1 AND course_id = $2
            "#,
        )
        .bind(digest.as_bytes())
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UnlockCodeRow::into_unlock_code).transpose()
    }

    async fn list_with_transactions(
        &self,
        page: &PageRequest,
    ) -> UnlockResult<(Vec<UnlockCodeWithTransaction>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM unlock_codes")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, UnlockCodeJoinRow>(
            r#"
            SELECT
                c.unlock_code_id,
                c.plain_code,
                c.code_digest,
                c.course_id,
                c.issued_to,
                c.issued_by,
                c.transaction_id,
                c.is_used,
                c.redeemed_by,
                c.redeemed_at,
                c.expires_at_ms,
                c.created_at,
                t.buyer_name AS tx_buyer_name,
                t.amount_minor AS tx_amount_minor,
                t.payment_method AS tx_payment_method,
                t.status AS tx_status
            FROM unlock_codes c
            JOIN unlock_transactions t ON t.transaction_id = c.transaction_id
            ORDER BY c.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(UnlockCodeJoinRow::into_code_with_transaction)
            .collect::<UnlockResult<Vec<_>>>()?;

        Ok((items, total as u64))
    }
}

impl RedemptionRepository for PgUnlockRepository {
    async fn consume_and_enroll(
        &self,
        code_id: &UnlockCodeId,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> UnlockResult<Enrollment> {
        let enrollment = Enrollment::new(*student_id, *course_id);

        let mut tx = self.pool.begin().await?;

        // Compare-and-set on is_used; zero rows means another request
        // already consumed this code.
        let updated = sqlx::query(
            r#"
            UPDATE unlock_codes
            SET is_used = TRUE, redeemed_by = $2, redeemed_at = $3
            WHERE unlock_code_id = $1 AND is_used = FALSE
            "#,
        )
        .bind(code_id.as_uuid())
        .bind(student_id.as_uuid())
        .bind(enrollment.enrolled_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tracing::warn!(unlock_code_id = %code_id, "Lost redemption race");
            return Err(UnlockError::CodeAlreadyRedeemed);
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO enrollments (enrollment_id, student_id, course_id, enrolled_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(enrollment.id.as_uuid())
        .bind(enrollment.student_id.as_uuid())
        .bind(enrollment.course_id.as_uuid())
        .bind(enrollment.enrolled_at)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {}
            // (student_id, course_id) uniqueness; dropping `tx` rolls the
            // code flip back with it.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(UnlockError::AlreadyEnrolled);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        tracing::info!(
            unlock_code_id = %code_id,
            enrollment_id = %enrollment.id,
            "Unlock code consumed and enrollment created"
        );

        Ok(enrollment)
    }
}

impl EnrollmentRepository for PgUnlockRepository {
    async fn is_enrolled(&self, student_id: &UserId, course_id: &CourseId) -> UnlockResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = $1 AND course_id = $2)",
        )
        .bind(student_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

impl CourseCatalog for PgUnlockRepository {
    async fn find_course(&self, course_id: &CourseId) -> UnlockResult<Option<CourseSummary>> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT course_id, course_title FROM courses WHERE course_id = $1",
        )
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, title)| CourseSummary {
            course_id: CourseId::from_uuid(id),
            title,
        }))
    }

    async fn increment_enrolled_count(&self, course_id: &CourseId) -> UnlockResult<()> {
        sqlx::query("UPDATE courses SET enrolled_count = enrolled_count + 1 WHERE course_id = $1")
            .bind(course_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct TransactionRow {
    transaction_id: Uuid,
    buyer_name: String,
    contact: String,
    payment_method: i16,
    payment_reference: Option<String>,
    course_id: Uuid,
    amount_minor: i64,
    notes: Option<String>,
    status: i16,
    issued_by: Uuid,
    unlock_code_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_record(self) -> TransactionRecord {
        TransactionRecord {
            id: TransactionId::from_uuid(self.transaction_id),
            buyer_name: BuyerName::from_db(self.buyer_name),
            contact: self.contact,
            payment_method: PaymentMethod::from_id(self.payment_method),
            payment_reference: self.payment_reference,
            course_id: CourseId::from_uuid(self.course_id),
            amount: Amount::from_db(self.amount_minor),
            notes: self.notes,
            status: TransactionStatus::from_id(self.status),
            issued_by: UserId::from_uuid(self.issued_by),
            unlock_code_id: self.unlock_code_id.map(UnlockCodeId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UnlockCodeRow {
    unlock_code_id: Uuid,
    plain_code: String,
    code_digest: Option<Vec<u8>>,
    course_id: Uuid,
    issued_to: String,
    issued_by: Uuid,
    transaction_id: Uuid,
    is_used: bool,
    redeemed_by: Option<Uuid>,
    redeemed_at: Option<DateTime<Utc>>,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl UnlockCodeRow {
    fn into_unlock_code(self) -> UnlockResult<UnlockCode> {
        // NULL digest only on legacy rows the startup backfill has not
        // reached; derive it from the stored plaintext.
        let code_digest = match self.code_digest {
            Some(bytes) => CodeDigest::from_bytes(&bytes)?,
            None => services::code_digest(&self.plain_code),
        };

        Ok(UnlockCode {
            id: UnlockCodeId::from_uuid(self.unlock_code_id),
            plain_code: self.plain_code,
            code_digest,
            course_id: CourseId::from_uuid(self.course_id),
            issued_to: self.issued_to,
            issued_by: UserId::from_uuid(self.issued_by),
            transaction_id: TransactionId::from_uuid(self.transaction_id),
            is_used: self.is_used,
            redeemed_by: self.redeemed_by.map(UserId::from_uuid),
            redeemed_at: self.redeemed_at,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UnlockCodeJoinRow {
    unlock_code_id: Uuid,
    plain_code: String,
    code_digest: Option<Vec<u8>>,
    course_id: Uuid,
    issued_to: String,
    issued_by: Uuid,
    transaction_id: Uuid,
    is_used: bool,
    redeemed_by: Option<Uuid>,
    redeemed_at: Option<DateTime<Utc>>,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
    tx_buyer_name: String,
    tx_amount_minor: i64,
    tx_payment_method: i16,
    tx_status: i16,
}

impl UnlockCodeJoinRow {
    fn into_code_with_transaction(self) -> UnlockResult<UnlockCodeWithTransaction> {
        let transaction = TransactionSummary {
            transaction_id: TransactionId::from_uuid(self.transaction_id),
            buyer_name: BuyerName::from_db(self.tx_buyer_name),
            amount: Amount::from_db(self.tx_amount_minor),
            payment_method: PaymentMethod::from_id(self.tx_payment_method),
            status: TransactionStatus::from_id(self.tx_status),
        };

        let code_row = UnlockCodeRow {
            unlock_code_id: self.unlock_code_id,
            plain_code: self.plain_code,
            code_digest: self.code_digest,
            course_id: self.course_id,
            issued_to: self.issued_to,
            issued_by: self.issued_by,
            transaction_id: self.transaction_id,
            is_used: self.is_used,
            redeemed_by: self.redeemed_by,
            redeemed_at: self.redeemed_at,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        };

        Ok(UnlockCodeWithTransaction {
            code: code_row.into_unlock_code()?,
            transaction,
        })
    }
}
