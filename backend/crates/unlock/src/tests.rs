//! Unit tests for the unlock ledger crate

#[cfg(test)]
mod fakes {
    use crate::domain::audit::{AuditEvent, AuditSink};
    use crate::domain::entities::{
        Enrollment, TransactionRecord, TransactionSummary, UnlockCode, UnlockCodeWithTransaction,
    };
    use crate::domain::repository::{
        CourseCatalog, EnrollmentRepository, RedemptionRepository, TransactionRepository,
        UnlockCodeRepository,
    };
    use crate::domain::value_objects::{CodeDigest, CourseSummary, TransactionStatus};
    use crate::error::{UnlockError, UnlockResult};
    use kernel::id::{CourseId, TransactionId, UnlockCodeId, UserId};
    use kernel::page::PageRequest;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    #[derive(Default)]
    struct LedgerState {
        transactions: HashMap<Uuid, TransactionRecord>,
        codes: HashMap<Uuid, UnlockCode>,
        enrollments: Vec<Enrollment>,
        courses: HashMap<Uuid, (String, i64)>,
    }

    /// In-memory stand-in for the PostgreSQL repository. One mutex over
    /// the whole state gives the same atomicity the SQL transaction does.
    #[derive(Default)]
    pub struct MemoryLedger {
        state: Mutex<LedgerState>,
        reject_code_creates: AtomicU32,
    }

    impl MemoryLedger {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_course(&self, title: &str) -> CourseId {
            let course_id = CourseId::new();
            self.state
                .lock()
                .unwrap()
                .courses
                .insert(course_id.into_uuid(), (title.to_string(), 0));
            course_id
        }

        /// Make the next `n` code inserts fail as digest collisions
        pub fn reject_next_code_creates(&self, n: u32) {
            self.reject_code_creates.store(n, Ordering::SeqCst);
        }

        pub fn code_count(&self) -> usize {
            self.state.lock().unwrap().codes.len()
        }

        pub fn enrollment_count(&self, student_id: &UserId, course_id: &CourseId) -> usize {
            self.state
                .lock()
                .unwrap()
                .enrollments
                .iter()
                .filter(|e| e.student_id == *student_id && e.course_id == *course_id)
                .count()
        }

        pub fn transaction_status(&self, id: &TransactionId) -> Option<TransactionStatus> {
            self.state
                .lock()
                .unwrap()
                .transactions
                .get(id.as_uuid())
                .map(|t| t.status)
        }

        pub fn enrolled_count(&self, course_id: &CourseId) -> i64 {
            self.state
                .lock()
                .unwrap()
                .courses
                .get(course_id.as_uuid())
                .map(|(_, count)| *count)
                .unwrap_or(0)
        }

        pub fn stored_code(&self, id: &UnlockCodeId) -> Option<UnlockCode> {
            self.state.lock().unwrap().codes.get(id.as_uuid()).cloned()
        }

        pub fn expire_code(&self, id: &UnlockCodeId) {
            if let Some(code) = self.state.lock().unwrap().codes.get_mut(id.as_uuid()) {
                code.expires_at_ms = chrono::Utc::now().timestamp_millis() - 1_000;
            }
        }
    }

    impl TransactionRepository for MemoryLedger {
        async fn create(&self, record: &TransactionRecord) -> UnlockResult<()> {
            self.state
                .lock()
                .unwrap()
                .transactions
                .insert(record.id.into_uuid(), record.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &TransactionId) -> UnlockResult<Option<TransactionRecord>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .transactions
                .get(id.as_uuid())
                .cloned())
        }

        async fn attach_code(
            &self,
            id: &TransactionId,
            code_id: &UnlockCodeId,
        ) -> UnlockResult<()> {
            let mut state = self.state.lock().unwrap();
            let record = state
                .transactions
                .get_mut(id.as_uuid())
                .ok_or_else(|| UnlockError::Internal("transaction missing".to_string()))?;
            record.attach_code(*code_id);
            Ok(())
        }

        async fn list(&self, page: &PageRequest) -> UnlockResult<(Vec<TransactionRecord>, u64)> {
            let state = self.state.lock().unwrap();
            let mut records: Vec<_> = state.transactions.values().cloned().collect();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let total = records.len() as u64;
            let items = records
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect();
            Ok((items, total))
        }
    }

    impl UnlockCodeRepository for MemoryLedger {
        async fn create(&self, code: &UnlockCode) -> UnlockResult<()> {
            if self
                .reject_code_creates
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(UnlockError::DuplicateDigest);
            }

            let mut state = self.state.lock().unwrap();
            if state
                .codes
                .values()
                .any(|c| c.code_digest == code.code_digest)
            {
                return Err(UnlockError::DuplicateDigest);
            }
            state.codes.insert(code.id.into_uuid(), code.clone());
            Ok(())
        }

        async fn find_by_digest_for_course(
            &self,
            digest: &CodeDigest,
            course_id: &CourseId,
        ) -> UnlockResult<Option<UnlockCode>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .codes
                .values()
                .find(|c| c.code_digest == *digest && c.course_id == *course_id)
                .cloned())
        }

        async fn list_with_transactions(
            &self,
            page: &PageRequest,
        ) -> UnlockResult<(Vec<UnlockCodeWithTransaction>, u64)> {
            let state = self.state.lock().unwrap();
            let mut codes: Vec<_> = state.codes.values().cloned().collect();
            codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let total = codes.len() as u64;
            let items = codes
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .map(|code| {
                    let record = state
                        .transactions
                        .get(code.transaction_id.as_uuid())
                        .ok_or_else(|| UnlockError::Internal("transaction missing".to_string()))?;
                    Ok(UnlockCodeWithTransaction {
                        transaction: TransactionSummary {
                            transaction_id: record.id,
                            buyer_name: record.buyer_name.clone(),
                            amount: record.amount,
                            payment_method: record.payment_method,
                            status: record.status,
                        },
                        code,
                    })
                })
                .collect::<UnlockResult<Vec<_>>>()?;
            Ok((items, total))
        }
    }

    impl RedemptionRepository for MemoryLedger {
        async fn consume_and_enroll(
            &self,
            code_id: &UnlockCodeId,
            student_id: &UserId,
            course_id: &CourseId,
        ) -> UnlockResult<Enrollment> {
            let mut state = self.state.lock().unwrap();

            if state
                .enrollments
                .iter()
                .any(|e| e.student_id == *student_id && e.course_id == *course_id)
            {
                return Err(UnlockError::AlreadyEnrolled);
            }

            let code = state
                .codes
                .get_mut(code_id.as_uuid())
                .ok_or_else(|| UnlockError::Internal("code missing".to_string()))?;
            if code.is_used {
                return Err(UnlockError::CodeAlreadyRedeemed);
            }
            code.mark_redeemed(*student_id);

            let enrollment = Enrollment::new(*student_id, *course_id);
            state.enrollments.push(enrollment.clone());
            Ok(enrollment)
        }
    }

    impl EnrollmentRepository for MemoryLedger {
        async fn is_enrolled(
            &self,
            student_id: &UserId,
            course_id: &CourseId,
        ) -> UnlockResult<bool> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .enrollments
                .iter()
                .any(|e| e.student_id == *student_id && e.course_id == *course_id))
        }
    }

    impl CourseCatalog for MemoryLedger {
        async fn find_course(&self, course_id: &CourseId) -> UnlockResult<Option<CourseSummary>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .courses
                .get(course_id.as_uuid())
                .map(|(title, _)| CourseSummary {
                    course_id: *course_id,
                    title: title.clone(),
                }))
        }

        async fn increment_enrolled_count(&self, course_id: &CourseId) -> UnlockResult<()> {
            let mut state = self.state.lock().unwrap();
            let entry = state
                .courses
                .get_mut(course_id.as_uuid())
                .ok_or(UnlockError::CourseNotFound)?;
            entry.1 += 1;
            Ok(())
        }
    }

    /// Captures audit events for assertions
    #[derive(Default)]
    pub struct RecordingAuditSink {
        events: Mutex<Vec<AuditEvent>>,
    }

    impl RecordingAuditSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<AuditEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AuditSink for RecordingAuditSink {
        async fn record(&self, event: &AuditEvent) -> UnlockResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// Audit sink that always fails, to prove failures never propagate
    pub struct FailingAuditSink;

    impl AuditSink for FailingAuditSink {
        async fn record(&self, _event: &AuditEvent) -> UnlockResult<()> {
            Err(UnlockError::Internal("audit sink down".to_string()))
        }
    }
}

#[cfg(test)]
mod support {
    use super::fakes::{MemoryLedger, RecordingAuditSink};
    use crate::application::config::UnlockConfig;
    use crate::application::issue_transaction::{
        IssueTransactionInput, IssueTransactionOutput, IssueTransactionUseCase,
    };
    use crate::application::redeem_code::RedeemCodeUseCase;
    use crate::domain::value_objects::PaymentMethod;
    use kernel::id::{CourseId, UserId};
    use std::sync::Arc;

    pub fn issue_use_case(
        ledger: &Arc<MemoryLedger>,
        audit: &Arc<RecordingAuditSink>,
    ) -> IssueTransactionUseCase<MemoryLedger, MemoryLedger, MemoryLedger, RecordingAuditSink>
    {
        IssueTransactionUseCase::new(
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            audit.clone(),
            Arc::new(UnlockConfig::default()),
        )
    }

    pub fn redeem_use_case(
        ledger: &Arc<MemoryLedger>,
        audit: &Arc<RecordingAuditSink>,
    ) -> RedeemCodeUseCase<
        MemoryLedger,
        MemoryLedger,
        MemoryLedger,
        MemoryLedger,
        MemoryLedger,
        RecordingAuditSink,
    > {
        RedeemCodeUseCase::new(
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            audit.clone(),
        )
    }

    pub fn sample_input(course_id: CourseId) -> IssueTransactionInput {
        IssueTransactionInput {
            buyer_name: "Asha".to_string(),
            contact: "+8801700000000".to_string(),
            payment_method: PaymentMethod::Cash,
            course_id,
            amount_minor: 1000,
            payment_reference: None,
            notes: None,
        }
    }

    pub async fn issue(
        ledger: &Arc<MemoryLedger>,
        audit: &Arc<RecordingAuditSink>,
        course_id: CourseId,
        issuer: UserId,
    ) -> IssueTransactionOutput {
        issue_use_case(ledger, audit)
            .execute(sample_input(course_id), issuer)
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod config_tests {
    use crate::application::config::UnlockConfig;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = UnlockConfig::default();

        assert_eq!(config.code_group_count, 2);
        assert_eq!(config.code_group_len, 4);
        assert_eq!(config.code_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.max_mint_attempts, 10);
    }

    #[test]
    fn test_ttl_ms() {
        let config = UnlockConfig::default();
        assert_eq!(config.code_ttl_ms(), 7 * 24 * 3600 * 1000);
    }
}

#[cfg(test)]
mod issue_tests {
    use super::fakes::{MemoryLedger, RecordingAuditSink};
    use super::support::{issue, issue_use_case, sample_input};
    use crate::domain::audit::AuditKind;
    use crate::domain::services::code_digest;
    use crate::domain::value_objects::TransactionStatus;
    use crate::error::UnlockError;
    use kernel::id::{CourseId, UserId};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_issue_happy_path() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let admin = UserId::new();

        let output = issue(&ledger, &audit, course_id, admin).await;

        assert_eq!(output.transaction.status, TransactionStatus::Completed);
        assert!(output.transaction.unlock_code_id.is_some());
        assert_eq!(output.transaction.amount.minor_units(), 1000);

        // Code persisted, unused, digest matches the plaintext
        let code_id = output.transaction.unlock_code_id.unwrap();
        let stored = ledger.stored_code(&code_id).unwrap();
        assert!(!stored.is_used);
        assert_eq!(stored.code_digest, code_digest(&output.plain_code));
        assert_eq!(stored.issued_to, "Asha");

        // Expires seven days out
        let expected = chrono::Utc::now().timestamp_millis() + 7 * 24 * 3600 * 1000;
        assert!((output.expires_at_ms - expected).abs() < 5_000);

        // Audit carries the plaintext for admin support
        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AuditKind::OfflineTransactionIssued);
        assert_eq!(
            events[0].details["plainCode"].as_str(),
            Some(output.plain_code.as_str())
        );
    }

    #[tokio::test]
    async fn test_issue_unknown_course() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let admin = UserId::new();

        let result = issue_use_case(&ledger, &audit)
            .execute(sample_input(CourseId::new()), admin)
            .await;

        assert!(matches!(result, Err(UnlockError::CourseNotFound)));
        assert_eq!(ledger.code_count(), 0);
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn test_issue_rejects_non_positive_amount() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        for amount in [0, -1000] {
            let mut input = sample_input(course_id);
            input.amount_minor = amount;
            let result = issue_use_case(&ledger, &audit)
                .execute(input, UserId::new())
                .await;
            assert!(matches!(result, Err(UnlockError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_issue_rejects_blank_buyer() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        let mut input = sample_input(course_id);
        input.buyer_name = "   ".to_string();
        let result = issue_use_case(&ledger, &audit)
            .execute(input, UserId::new())
            .await;
        assert!(matches!(result, Err(UnlockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_issue_retries_on_digest_collision() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        // Nine collisions, success on the tenth attempt
        ledger.reject_next_code_creates(9);

        let output = issue_use_case(&ledger, &audit)
            .execute(sample_input(course_id), UserId::new())
            .await
            .unwrap();

        assert_eq!(ledger.code_count(), 1);
        assert_eq!(output.transaction.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_issue_exhausts_retry_budget() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        ledger.reject_next_code_creates(u32::MAX);

        let result = issue_use_case(&ledger, &audit)
            .execute(sample_input(course_id), UserId::new())
            .await;

        assert!(matches!(result, Err(UnlockError::CodeGenerationExhausted)));
        assert_eq!(ledger.code_count(), 0);
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_mint_leaves_pending_marker() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        ledger.reject_next_code_creates(u32::MAX);

        let _ = issue_use_case(&ledger, &audit)
            .execute(sample_input(course_id), UserId::new())
            .await;

        // The transaction row survives in its recoverable state
        let (records, total) = {
            use crate::domain::repository::TransactionRepository;
            ledger.list(&kernel::page::PageRequest::default()).await.unwrap()
        };
        assert_eq!(total, 1);
        assert_eq!(records[0].status, TransactionStatus::PendingRedemption);
        assert!(records[0].unlock_code_id.is_none());
    }
}

#[cfg(test)]
mod redeem_tests {
    use super::fakes::{MemoryLedger, RecordingAuditSink};
    use super::support::{issue, redeem_use_case};
    use crate::application::redeem_code::RedeemCodeInput;
    use crate::domain::audit::AuditKind;
    use crate::error::UnlockError;
    use kernel::id::UserId;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_redeem_happy_path() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let admin = UserId::new();
        let student = UserId::new();

        let issued = issue(&ledger, &audit, course_id, admin).await;

        let output = redeem_use_case(&ledger, &audit)
            .execute(
                RedeemCodeInput {
                    plain_code: issued.plain_code.clone(),
                    course_id,
                },
                student,
            )
            .await
            .unwrap();

        assert_eq!(output.enrollment.student_id, student);
        assert_eq!(output.enrollment.course_id, course_id);
        assert_eq!(ledger.enrollment_count(&student, &course_id), 1);
        assert_eq!(ledger.enrolled_count(&course_id), 1);

        // Code is now consumed and attributed
        let code_id = issued.transaction.unlock_code_id.unwrap();
        let stored = ledger.stored_code(&code_id).unwrap();
        assert!(stored.is_used);
        assert_eq!(stored.redeemed_by, Some(student));
        assert!(stored.redeemed_at.is_some());

        // Issue + redemption audit events, redemption carries the amount
        let events = audit.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, AuditKind::CodeRedeemed);
        assert_eq!(events[1].details["amountMinor"].as_i64(), Some(1000));
    }

    #[tokio::test]
    async fn test_redeem_accepts_unnormalized_input() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        let issued = issue(&ledger, &audit, course_id, UserId::new()).await;
        let sloppy = format!("  {}  ", issued.plain_code.to_lowercase());

        let result = redeem_use_case(&ledger, &audit)
            .execute(
                RedeemCodeInput {
                    plain_code: sloppy,
                    course_id,
                },
                UserId::new(),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_redeem_twice_fails() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let student = UserId::new();

        let issued = issue(&ledger, &audit, course_id, UserId::new()).await;
        let input = RedeemCodeInput {
            plain_code: issued.plain_code,
            course_id,
        };

        let use_case = redeem_use_case(&ledger, &audit);
        use_case.execute(input.clone(), student).await.unwrap();

        let second = use_case.execute(input, student).await;
        assert!(matches!(second, Err(UnlockError::CodeAlreadyRedeemed)));
        assert_eq!(ledger.enrollment_count(&student, &course_id), 1);
    }

    #[tokio::test]
    async fn test_redeem_wrong_course() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_a = ledger.insert_course("Course A");
        let course_b = ledger.insert_course("Course B");
        let student = UserId::new();

        let issued = issue(&ledger, &audit, course_a, UserId::new()).await;

        let result = redeem_use_case(&ledger, &audit)
            .execute(
                RedeemCodeInput {
                    plain_code: issued.plain_code,
                    course_id: course_b,
                },
                student,
            )
            .await;

        assert!(matches!(result, Err(UnlockError::CodeNotFoundForCourse)));

        // Nothing mutated: code still unused, no enrollment anywhere
        let code_id = issued.transaction.unlock_code_id.unwrap();
        assert!(!ledger.stored_code(&code_id).unwrap().is_used);
        assert_eq!(ledger.enrollment_count(&student, &course_a), 0);
        assert_eq!(ledger.enrollment_count(&student, &course_b), 0);
    }

    #[tokio::test]
    async fn test_redeem_expired_code() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let student = UserId::new();

        let issued = issue(&ledger, &audit, course_id, UserId::new()).await;
        let code_id = issued.transaction.unlock_code_id.unwrap();
        ledger.expire_code(&code_id);

        let result = redeem_use_case(&ledger, &audit)
            .execute(
                RedeemCodeInput {
                    plain_code: issued.plain_code,
                    course_id,
                },
                student,
            )
            .await;

        assert!(matches!(result, Err(UnlockError::CodeExpired)));
        assert!(!ledger.stored_code(&code_id).unwrap().is_used);
        assert_eq!(ledger.enrollment_count(&student, &course_id), 0);
    }

    #[tokio::test]
    async fn test_redeem_already_enrolled() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let student = UserId::new();

        // Two codes for the same course; the student redeems one, then
        // tries the other.
        let first = issue(&ledger, &audit, course_id, UserId::new()).await;
        let second = issue(&ledger, &audit, course_id, UserId::new()).await;

        let use_case = redeem_use_case(&ledger, &audit);
        use_case
            .execute(
                RedeemCodeInput {
                    plain_code: first.plain_code,
                    course_id,
                },
                student,
            )
            .await
            .unwrap();

        let result = use_case
            .execute(
                RedeemCodeInput {
                    plain_code: second.plain_code.clone(),
                    course_id,
                },
                student,
            )
            .await;

        assert!(matches!(result, Err(UnlockError::AlreadyEnrolled)));
        assert_eq!(ledger.enrollment_count(&student, &course_id), 1);

        // The second code stays redeemable for someone else
        let code_id = second.transaction.unlock_code_id.unwrap();
        assert!(!ledger.stored_code(&code_id).unwrap().is_used);
    }

    #[tokio::test]
    async fn test_redeem_blank_code() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        let result = redeem_use_case(&ledger, &audit)
            .execute(
                RedeemCodeInput {
                    plain_code: " - - ".to_string(),
                    course_id,
                },
                UserId::new(),
            )
            .await;

        assert!(matches!(result, Err(UnlockError::Validation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_double_redemption() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let student = UserId::new();

        let issued = issue(&ledger, &audit, course_id, UserId::new()).await;
        let input = RedeemCodeInput {
            plain_code: issued.plain_code,
            course_id,
        };

        let use_case = Arc::new(redeem_use_case(&ledger, &audit));
        let (a, b) = tokio::join!(
            {
                let use_case = use_case.clone();
                let input = input.clone();
                async move { use_case.execute(input, student).await }
            },
            {
                let use_case = use_case.clone();
                let input = input.clone();
                async move { use_case.execute(input, student).await }
            }
        );

        let results = [a, b];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one redemption must win");

        let failure = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            failure,
            Err(UnlockError::CodeAlreadyRedeemed) | Err(UnlockError::AlreadyEnrolled)
        ));

        assert_eq!(ledger.enrollment_count(&student, &course_id), 1);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_redemption() {
        use super::fakes::FailingAuditSink;
        use crate::application::redeem_code::RedeemCodeUseCase;

        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");
        let student = UserId::new();

        let issued = issue(&ledger, &audit, course_id, UserId::new()).await;

        let use_case = RedeemCodeUseCase::new(
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            Arc::new(FailingAuditSink),
        );

        let result = use_case
            .execute(
                RedeemCodeInput {
                    plain_code: issued.plain_code,
                    course_id,
                },
                student,
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(ledger.enrollment_count(&student, &course_id), 1);
    }
}

#[cfg(test)]
mod listing_tests {
    use super::fakes::{MemoryLedger, RecordingAuditSink};
    use super::support::issue;
    use crate::application::list_codes::ListCodesUseCase;
    use crate::application::list_transactions::ListTransactionsUseCase;
    use kernel::id::UserId;
    use kernel::page::PageRequest;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_transactions_pagination() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        for _ in 0..5 {
            issue(&ledger, &audit, course_id, UserId::new()).await;
        }

        let use_case = ListTransactionsUseCase::new(ledger.clone());

        let page = use_case
            .execute(PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);

        let last = use_case
            .execute(PageRequest::new(Some(3), Some(2)))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
    }

    #[tokio::test]
    async fn test_list_codes_includes_transaction_summary() {
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let course_id = ledger.insert_course("Intro to Rust");

        let issued = issue(&ledger, &audit, course_id, UserId::new()).await;

        let use_case = ListCodesUseCase::new(ledger.clone());
        let page = use_case.execute(PageRequest::default()).await.unwrap();

        assert_eq!(page.total, 1);
        let item = &page.items[0];
        assert_eq!(item.code.plain_code, issued.plain_code);
        assert_eq!(item.transaction.transaction_id, issued.transaction.id);
        assert_eq!(item.transaction.buyer_name.as_str(), "Asha");
        assert_eq!(item.transaction.amount.minor_units(), 1000);
    }
}

#[cfg(test)]
mod dto_tests {
    use crate::presentation::dto::*;

    #[test]
    fn test_issue_request_deserialization() {
        let json = r#"{
            "buyerName": "Asha",
            "contact": "+8801700000000",
            "paymentMethod": "bank_transfer",
            "courseId": "00000000-0000-0000-0000-000000000000",
            "amountMinor": 1000
        }"#;
        let request: IssueTransactionRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.buyer_name, "Asha");
        assert_eq!(request.payment_method, "bank_transfer");
        assert_eq!(request.amount_minor, 1000);
        assert!(request.payment_reference.is_none());
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_redeem_request_deserialization() {
        let json =
            r#"{"code":"ABCD-1234","courseId":"00000000-0000-0000-0000-000000000000"}"#;
        let request: RedeemRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.code, "ABCD-1234");
        assert_eq!(request.course_id, uuid::Uuid::nil());
    }

    #[test]
    fn test_paginated_response_serialization() {
        let response = PaginatedResponse::<u32> {
            items: vec![1, 2, 3],
            page: 2,
            limit: 3,
            total: 7,
            total_pages: 3,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""totalPages":3"#));
        assert!(json.contains(r#""total":7"#));
        assert!(json.contains(r#""page":2"#));
    }

    #[test]
    fn test_page_query_defaults() {
        let query: PageQuery = serde_json::from_str("{}").unwrap();
        assert!(query.page.is_none());
        assert!(query.limit.is_none());
    }
}

#[cfg(test)]
mod error_tests {
    use crate::error::*;
    use axum::http::StatusCode;
    use kernel::error::kind::ErrorKind;

    #[test]
    fn test_error_status_codes() {
        let test_cases: Vec<(UnlockError, StatusCode)> = vec![
            (
                UnlockError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (UnlockError::Forbidden, StatusCode::FORBIDDEN),
            (UnlockError::CourseNotFound, StatusCode::NOT_FOUND),
            (UnlockError::CodeNotFoundForCourse, StatusCode::NOT_FOUND),
            (UnlockError::CodeAlreadyRedeemed, StatusCode::CONFLICT),
            (UnlockError::AlreadyEnrolled, StatusCode::CONFLICT),
            (UnlockError::DuplicateDigest, StatusCode::CONFLICT),
            (UnlockError::CodeExpired, StatusCode::GONE),
            (
                UnlockError::CodeGenerationExhausted,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                UnlockError::MissingHeader("x-actor-id".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                UnlockError::Internal("test".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(
                error.status_code(),
                expected_status,
                "{:?} should map to {}",
                error,
                expected_status
            );
        }
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(UnlockError::CodeExpired.kind(), ErrorKind::Gone);
        assert_eq!(UnlockError::AlreadyEnrolled.kind(), ErrorKind::Conflict);
        assert_eq!(UnlockError::CourseNotFound.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_error_display() {
        assert!(UnlockError::CodeExpired.to_string().contains("expired"));
        assert!(
            UnlockError::CodeAlreadyRedeemed
                .to_string()
                .contains("already redeemed")
        );
        assert!(
            UnlockError::AlreadyEnrolled
                .to_string()
                .contains("already enrolled")
        );
    }

    #[test]
    fn test_to_app_error_keeps_kind_and_message() {
        let app_err = UnlockError::CodeNotFoundForCourse.to_app_error();
        assert_eq!(app_err.status_code(), 404);
        assert!(app_err.message().contains("not valid for this course"));
    }
}
