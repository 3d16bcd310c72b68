//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains one use case per boundary operation.

pub mod config;
pub mod issue_transaction;
pub mod list_codes;
pub mod list_transactions;
pub mod redeem_code;

// Re-exports
pub use config::UnlockConfig;
pub use issue_transaction::{
    IssueTransactionInput, IssueTransactionOutput, IssueTransactionUseCase,
};
pub use list_codes::ListCodesUseCase;
pub use list_transactions::ListTransactionsUseCase;
pub use redeem_code::{RedeemCodeInput, RedeemCodeOutput, RedeemCodeUseCase};
