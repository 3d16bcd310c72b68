//! List Transactions Use Case

use crate::domain::entities::TransactionRecord;
use crate::domain::repository::TransactionRepository;
use crate::error::UnlockResult;
use kernel::page::{PageRequest, Paginated};
use std::sync::Arc;

/// List Transactions Use Case
pub struct ListTransactionsUseCase<T>
where
    T: TransactionRepository,
{
    transaction_repo: Arc<T>,
}

impl<T> ListTransactionsUseCase<T>
where
    T: TransactionRepository,
{
    pub fn new(transaction_repo: Arc<T>) -> Self {
        Self { transaction_repo }
    }

    pub async fn execute(&self, page: PageRequest) -> UnlockResult<Paginated<TransactionRecord>> {
        let (items, total) = self.transaction_repo.list(&page).await?;
        Ok(Paginated::new(items, &page, total))
    }
}
