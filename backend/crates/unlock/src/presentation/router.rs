//! Unlock Ledger Router

use crate::application::config::UnlockConfig;
use crate::domain::audit::AuditSink;
use crate::domain::repository::{
    CourseCatalog, EnrollmentRepository, RedemptionRepository, TransactionRepository,
    UnlockCodeRepository,
};
use crate::infra::audit::TracingAuditSink;
use crate::infra::postgres::PgUnlockRepository;
use crate::presentation::handlers::{self, UnlockAppState};
use crate::presentation::middleware::require_actor;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

/// Create the ledger router with the PostgreSQL repository
pub fn unlock_router(
    repo: PgUnlockRepository,
    audit: TracingAuditSink,
    config: UnlockConfig,
) -> Router {
    unlock_router_generic(repo, audit, config)
}

/// Create a generic ledger router for any repository implementation
pub fn unlock_router_generic<R, S>(repo: R, audit: S, config: UnlockConfig) -> Router
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
    let state = UnlockAppState {
        repo: Arc::new(repo),
        audit: Arc::new(audit),
        config: Arc::new(config),
    };

    Router::new()
        .route(
            "/transactions",
            post(handlers::issue_transaction::<R, S>).get(handlers::list_transactions::<R, S>),
        )
        .route("/redeem", post(handlers::redeem_code::<R, S>))
        .route("/codes", get(handlers::list_codes::<R, S>))
        .layer(axum::middleware::from_fn(require_actor))
        .with_state(state)
}
