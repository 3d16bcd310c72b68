//! Repository Traits
//!
//! Interfaces for data persistence and consumed collaborators.
//! Implementations live in the infrastructure layer.

use crate::domain::entities::{
    Enrollment, TransactionRecord, UnlockCode, UnlockCodeWithTransaction,
};
use crate::domain::value_objects::{CodeDigest, CourseSummary};
use crate::error::UnlockResult;
use kernel::id::{CourseId, TransactionId, UnlockCodeId, UserId};
use kernel::page::PageRequest;

/// Offline transaction repository trait
#[trait_variant::make(TransactionRepository: Send)]
pub trait LocalTransactionRepository {
    /// Persist a new transaction record
    async fn create(&self, record: &TransactionRecord) -> UnlockResult<()>;

    /// Find a transaction by ID
    async fn find_by_id(&self, id: &TransactionId) -> UnlockResult<Option<TransactionRecord>>;

    /// Attach the minted code reference and flip the record to completed
    async fn attach_code(
        &self,
        id: &TransactionId,
        code_id: &UnlockCodeId,
    ) -> UnlockResult<()>;

    /// List transactions, newest first, with the total row count
    async fn list(&self, page: &PageRequest) -> UnlockResult<(Vec<TransactionRecord>, u64)>;
}

/// Unlock code repository trait
#[trait_variant::make(UnlockCodeRepository: Send)]
pub trait LocalUnlockCodeRepository {
    /// Persist a new code
    ///
    /// Returns `UnlockError::DuplicateDigest` when the digest uniqueness
    /// constraint rejects the row; the caller retries with a fresh code.
    async fn create(&self, code: &UnlockCode) -> UnlockResult<()>;

    /// Look up a code by digest, scoped to the course it was minted for
    async fn find_by_digest_for_course(
        &self,
        digest: &CodeDigest,
        course_id: &CourseId,
    ) -> UnlockResult<Option<UnlockCode>>;

    /// List codes with their owning transaction summaries, newest first
    async fn list_with_transactions(
        &self,
        page: &PageRequest,
    ) -> UnlockResult<(Vec<UnlockCodeWithTransaction>, u64)>;
}

/// Atomic consume-and-enroll boundary
#[trait_variant::make(RedemptionRepository: Send)]
pub trait LocalRedemptionRepository {
    /// Consume the code and create the enrollment in one transaction.
    ///
    /// The code flip is a conditional write on `is_used = false`; losing
    /// the race yields `CodeAlreadyRedeemed`, a duplicate enrollment
    /// yields `AlreadyEnrolled`, and any storage failure rolls back both
    /// writes.
    async fn consume_and_enroll(
        &self,
        code_id: &UnlockCodeId,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> UnlockResult<Enrollment>;
}

/// Enrollment ledger trait
#[trait_variant::make(EnrollmentRepository: Send)]
pub trait LocalEnrollmentRepository {
    /// Whether the student already holds access to the course
    async fn is_enrolled(&self, student_id: &UserId, course_id: &CourseId) -> UnlockResult<bool>;
}

/// Course catalog port (consumed collaborator)
#[trait_variant::make(CourseCatalog: Send)]
pub trait LocalCourseCatalog {
    /// Course existence and title lookup
    async fn find_course(&self, course_id: &CourseId) -> UnlockResult<Option<CourseSummary>>;

    /// Bump the denormalized enrolled-count counter (best effort)
    async fn increment_enrolled_count(&self, course_id: &CourseId) -> UnlockResult<()>;
}
