//! List Unlock Codes Use Case

use crate::domain::entities::UnlockCodeWithTransaction;
use crate::domain::repository::UnlockCodeRepository;
use crate::error::UnlockResult;
use kernel::page::{PageRequest, Paginated};
use std::sync::Arc;

/// List Unlock Codes Use Case
///
/// Codes are returned with a summary of their owning transaction for
/// the admin console.
pub struct ListCodesUseCase<C>
where
    C: UnlockCodeRepository,
{
    code_repo: Arc<C>,
}

impl<C> ListCodesUseCase<C>
where
    C: UnlockCodeRepository,
{
    pub fn new(code_repo: Arc<C>) -> Self {
        Self { code_repo }
    }

    pub async fn execute(
        &self,
        page: PageRequest,
    ) -> UnlockResult<Paginated<UnlockCodeWithTransaction>> {
        let (items, total) = self.code_repo.list_with_transactions(&page).await?;
        Ok(Paginated::new(items, &page, total))
    }
}
