//! Infrastructure Layer
//!
//! Database implementations and external service adapters.

pub mod audit;
pub mod postgres;

pub use audit::TracingAuditSink;
pub use postgres::PgUnlockRepository;
