//! Unlock Ledger Error Types
//!
//! This module provides ledger-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Ledger-specific result type alias
pub type UnlockResult<T> = Result<T, UnlockError>;

/// Ledger-specific error variants
///
/// Every failure of the issuance and redemption state machines maps to
/// a distinct variant; all are recovered at the service boundary.
#[derive(Debug, Error)]
pub enum UnlockError {
    /// Missing or malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Course does not exist
    #[error("Course not found")]
    CourseNotFound,

    /// Code minting retry budget exceeded
    #[error("Could not generate a unique unlock code")]
    CodeGenerationExhausted,

    /// No code with this digest exists for the requested course
    #[error("Unlock code not valid for this course")]
    CodeNotFoundForCourse,

    /// Code was already consumed
    #[error("Unlock code already redeemed")]
    CodeAlreadyRedeemed,

    /// Code validity window has passed
    #[error("Unlock code expired")]
    CodeExpired,

    /// Student already holds an enrollment for the course
    #[error("Student is already enrolled in this course")]
    AlreadyEnrolled,

    /// Digest uniqueness violation on insert; retried internally
    #[error("Unlock code digest already exists")]
    DuplicateDigest,

    /// Caller lacks the required role
    #[error("Operation not permitted for this role")]
    Forbidden,

    /// Missing required header (e.g. identity headers)
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UnlockError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            UnlockError::Validation(_) | UnlockError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            UnlockError::Forbidden => StatusCode::FORBIDDEN,
            UnlockError::CourseNotFound | UnlockError::CodeNotFoundForCourse => {
                StatusCode::NOT_FOUND
            }
            UnlockError::CodeAlreadyRedeemed
            | UnlockError::AlreadyEnrolled
            | UnlockError::DuplicateDigest => StatusCode::CONFLICT,
            UnlockError::CodeExpired => StatusCode::GONE,
            UnlockError::CodeGenerationExhausted
            | UnlockError::Database(_)
            | UnlockError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UnlockError::Validation(_) | UnlockError::MissingHeader(_) => ErrorKind::BadRequest,
            UnlockError::Forbidden => ErrorKind::Forbidden,
            UnlockError::CourseNotFound | UnlockError::CodeNotFoundForCourse => {
                ErrorKind::NotFound
            }
            UnlockError::CodeAlreadyRedeemed
            | UnlockError::AlreadyEnrolled
            | UnlockError::DuplicateDigest => ErrorKind::Conflict,
            UnlockError::CodeExpired => ErrorKind::Gone,
            UnlockError::CodeGenerationExhausted
            | UnlockError::Database(_)
            | UnlockError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            UnlockError::Database(e) => {
                tracing::error!(error = %e, "Unlock ledger database error");
            }
            UnlockError::Internal(msg) => {
                tracing::error!(message = %msg, "Unlock ledger internal error");
            }
            UnlockError::CodeGenerationExhausted => {
                tracing::error!("Unlock code generation retry budget exhausted");
            }
            UnlockError::CodeAlreadyRedeemed => {
                tracing::warn!("Attempt to redeem a consumed unlock code");
            }
            UnlockError::Forbidden => {
                tracing::warn!("Role check rejected a ledger operation");
            }
            _ => {
                tracing::debug!(error = %self, "Unlock ledger error");
            }
        }
    }
}

impl IntoResponse for UnlockError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for UnlockError {
    fn from(err: AppError) -> Self {
        UnlockError::Internal(err.to_string())
    }
}
