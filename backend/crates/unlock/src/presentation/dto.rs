//! API DTOs (Data Transfer Objects)

use crate::domain::entities::{
    Enrollment, TransactionRecord, TransactionSummary, UnlockCodeWithTransaction,
};
use chrono::{DateTime, Utc};
use kernel::page::Paginated;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/unlock/transactions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTransactionRequest {
    pub buyer_name: String,
    pub contact: String,
    pub payment_method: String,
    pub course_id: Uuid,
    pub amount_minor: i64,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One offline transaction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub buyer_name: String,
    pub contact: String,
    pub payment_method: &'static str,
    pub payment_reference: Option<String>,
    pub course_id: Uuid,
    pub amount_minor: i64,
    pub notes: Option<String>,
    pub status: &'static str,
    pub issued_by: Uuid,
    pub unlock_code_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            transaction_id: record.id.into_uuid(),
            buyer_name: record.buyer_name.to_string(),
            contact: record.contact,
            payment_method: record.payment_method.code(),
            payment_reference: record.payment_reference,
            course_id: record.course_id.into_uuid(),
            amount_minor: record.amount.minor_units(),
            notes: record.notes,
            status: record.status.code(),
            issued_by: record.issued_by.into_uuid(),
            unlock_code_id: record.unlock_code_id.map(|id| id.into_uuid()),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for POST /api/unlock/transactions
///
/// The plaintext code appears here once, for the admin to hand to the
/// buyer; afterwards it is only visible in the admin code listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTransactionResponse {
    pub transaction: TransactionResponse,
    pub plain_code: String,
    pub expires_at_ms: i64,
}

/// Request for POST /api/unlock/redeem
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub code: String,
    pub course_id: Uuid,
}

/// One enrollment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            enrollment_id: enrollment.id.into_uuid(),
            student_id: enrollment.student_id.into_uuid(),
            course_id: enrollment.course_id.into_uuid(),
            enrolled_at: enrollment.enrolled_at,
        }
    }
}

/// Response for POST /api/unlock/redeem
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub enrollment: EnrollmentResponse,
}

/// Transaction slice embedded in the code listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummaryResponse {
    pub transaction_id: Uuid,
    pub buyer_name: String,
    pub amount_minor: i64,
    pub payment_method: &'static str,
    pub status: &'static str,
}

impl From<TransactionSummary> for TransactionSummaryResponse {
    fn from(summary: TransactionSummary) -> Self {
        Self {
            transaction_id: summary.transaction_id.into_uuid(),
            buyer_name: summary.buyer_name.to_string(),
            amount_minor: summary.amount.minor_units(),
            payment_method: summary.payment_method.code(),
            status: summary.status.code(),
        }
    }
}

/// One unlock code with its owning transaction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockCodeResponse {
    pub unlock_code_id: Uuid,
    pub plain_code: String,
    pub course_id: Uuid,
    pub issued_to: String,
    pub issued_by: Uuid,
    pub is_used: bool,
    pub redeemed_by: Option<Uuid>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
    pub transaction: TransactionSummaryResponse,
}

impl From<UnlockCodeWithTransaction> for UnlockCodeResponse {
    fn from(item: UnlockCodeWithTransaction) -> Self {
        Self {
            unlock_code_id: item.code.id.into_uuid(),
            plain_code: item.code.plain_code,
            course_id: item.code.course_id.into_uuid(),
            issued_to: item.code.issued_to,
            issued_by: item.code.issued_by.into_uuid(),
            is_used: item.code.is_used,
            redeemed_by: item.code.redeemed_by.map(|id| id.into_uuid()),
            redeemed_at: item.code.redeemed_at,
            expires_at_ms: item.code.expires_at_ms,
            created_at: item.code.created_at,
            transaction: item.transaction.into(),
        }
    }
}

/// Query parameters for the listing endpoints
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Generic page envelope
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn from_paginated<U>(page: Paginated<U>) -> Self
    where
        U: Into<T>,
    {
        let total_pages = page.total_pages();
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages,
            items: page.items.into_iter().map(Into::into).collect(),
        }
    }
}
