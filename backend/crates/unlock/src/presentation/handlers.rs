//! HTTP Handlers

use crate::application::config::UnlockConfig;
use crate::application::issue_transaction::{IssueTransactionInput, IssueTransactionUseCase};
use crate::application::list_codes::ListCodesUseCase;
use crate::application::list_transactions::ListTransactionsUseCase;
use crate::application::redeem_code::{RedeemCodeInput, RedeemCodeUseCase};
use crate::domain::audit::AuditSink;
use crate::domain::repository::{
    CourseCatalog, EnrollmentRepository, RedemptionRepository, TransactionRepository,
    UnlockCodeRepository,
};
use crate::domain::value_objects::{Actor, PaymentMethod};
use crate::error::{UnlockError, UnlockResult};
use crate::presentation::dto::{
    IssueTransactionRequest, IssueTransactionResponse, PageQuery, PaginatedResponse,
    RedeemRequest, RedeemResponse, TransactionResponse, UnlockCodeResponse,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use kernel::id::CourseId;
use kernel::page::PageRequest;
use std::sync::Arc;

/// Shared state for ledger handlers
#[derive(Clone)]
pub struct UnlockAppState<R, S>
where
    R: TransactionRepository
        + UnlockCodeRepository
        + RedemptionRepository
        + EnrollmentRepository
        + CourseCatalog
        + Clone
        + Send
        + Sync
        + 'static,
    S: AuditSink + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub audit: Arc<S>,
    pub config: Arc<UnlockConfig>,
}

/// POST /api/unlock/transactions
pub async fn issue_transaction<R, S>(
    State(state): State<UnlockAppState<R, S>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<IssueTransactionRequest>,
) -> UnlockResult<impl IntoResponse>
where
    R: TransactionRepository
        + UnlockCodeRepository
        + RedemptionRepository
        + EnrollmentRepository
        + CourseCatalog
        + Clone
        + Send
        + Sync
        + 'static,
    S: AuditSink + Clone + Send + Sync + 'static,
{
    if !actor.role.is_admin() {
        return Err(UnlockError::Forbidden);
    }

    let payment_method = PaymentMethod::parse(&req.payment_method).ok_or_else(|| {
        UnlockError::Validation(format!("unknown payment method: {}", req.payment_method))
    })?;

    let use_case = IssueTransactionUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.audit.clone(),
        state.config.clone(),
    );

    let input = IssueTransactionInput {
        buyer_name: req.buyer_name,
        contact: req.contact,
        payment_method,
        course_id: CourseId::from_uuid(req.course_id),
        amount_minor: req.amount_minor,
        payment_reference: req.payment_reference,
        notes: req.notes,
    };

    let output = use_case.execute(input, actor.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueTransactionResponse {
            transaction: output.transaction.into(),
            plain_code: output.plain_code,
            expires_at_ms: output.expires_at_ms,
        }),
    ))
}

/// POST /api/unlock/redeem
pub async fn redeem_code<R, S>(
    State(state): State<UnlockAppState<R, S>>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<RedeemRequest>,
) -> UnlockResult<impl IntoResponse>
where
    R: TransactionRepository
        + UnlockCodeRepository
        + RedemptionRepository
        + EnrollmentRepository
        + CourseCatalog
        + Clone
        + Send
        + Sync
        + 'static,
    S: AuditSink + Clone + Send + Sync + 'static,
{
    let use_case = RedeemCodeUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.audit.clone(),
    );

    let input = RedeemCodeInput {
        plain_code: req.code,
        course_id: CourseId::from_uuid(req.course_id),
    };

    let output = use_case.execute(input, actor.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RedeemResponse {
            enrollment: output.enrollment.into(),
        }),
    ))
}

/// GET /api/unlock/transactions
pub async fn list_transactions<R, S>(
    State(state): State<UnlockAppState<R, S>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> UnlockResult<Json<PaginatedResponse<TransactionResponse>>>
where
    R: TransactionRepository
        + UnlockCodeRepository
        + RedemptionRepository
        + EnrollmentRepository
        + CourseCatalog
        + Clone
        + Send
        + Sync
        + 'static,
    S: AuditSink + Clone + Send + Sync + 'static,
{
    if !actor.role.is_admin() {
        return Err(UnlockError::Forbidden);
    }

    let use_case = ListTransactionsUseCase::new(state.repo.clone());
    let result = use_case
        .execute(PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(PaginatedResponse::from_paginated(result)))
}

/// GET /api/unlock/codes
pub async fn list_codes<R, S>(
    State(state): State<UnlockAppState<R, S>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<PageQuery>,
) -> UnlockResult<Json<PaginatedResponse<UnlockCodeResponse>>>
where
    R: TransactionRepository
        + UnlockCodeRepository
        + RedemptionRepository
        + EnrollmentRepository
        + CourseCatalog
        + Clone
        + Send
        + Sync
        + 'static,
    S: AuditSink + Clone + Send + Sync + 'static,
{
    if !actor.role.is_admin() {
        return Err(UnlockError::Forbidden);
    }

    let use_case = ListCodesUseCase::new(state.repo.clone());
    let result = use_case
        .execute(PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(PaginatedResponse::from_paginated(result)))
}
