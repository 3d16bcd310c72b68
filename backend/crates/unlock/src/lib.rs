//! Unlock-Code Ledger Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Ledger Model
//! - An admin records a manually-settled offline payment; the system
//!   mints a single-use unlock code bound to that payment and a course
//! - The code's SHA-256 digest is the authoritative, unique lookup key;
//!   the plaintext is retained for display and audit only
//! - Redemption consumes the code exactly once: the `is_used` flip and
//!   the enrollment insert share one storage transaction
//! - Expiry is soft and read-time derived; codes are never deleted

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::UnlockConfig;
pub use error::{UnlockError, UnlockResult};
pub use infra::audit::TracingAuditSink;
pub use infra::postgres::PgUnlockRepository;
pub use presentation::router::unlock_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
