//! Account creation and read-only lookups.

use std::sync::Arc;

use ledger_core::{Account, AccountId, Amount, LedgerError, Result, Transaction, TransactionId};
use ledger_store::LedgerStore;

/// Default page size for transaction listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest page size a caller may request.
pub const MAX_LIST_LIMIT: usize = 100;

/// Account and transaction administration.
///
/// Nothing here takes row locks: creation is a single insert-if-absent and
/// every read sees the last committed state.
#[derive(Clone)]
pub struct AccountAdmin {
    store: Arc<dyn LedgerStore>,
}

impl AccountAdmin {
    /// Create an admin over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open a new account with `initial_balance`.
    ///
    /// # Errors
    ///
    /// Returns `AccountAlreadyExists` if `id` is taken, or `Conflict` if the
    /// store fails.
    pub async fn create(&self, id: AccountId, initial_balance: Amount) -> Result<Account> {
        let account = self.store.create_account(id, initial_balance).await?;
        tracing::info!(account_id = %id, balance = %initial_balance, "Account created");
        Ok(account)
    }

    /// Fetch an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn get(&self, id: AccountId) -> Result<Account> {
        self.store
            .get_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound { account_id: id })
    }

    /// Fetch a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if it does not exist.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.store
            .get_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound { transaction_id: id })
    }

    /// List transactions touching `account_id`, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_LIST_LIMIT`] and is clamped to
    /// `1..=MAX_LIST_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        self.get(account_id).await?;

        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        Ok(self
            .store
            .list_transactions_by_account(account_id, limit, offset)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use ledger_core::ErrorKind;
    use ledger_store::MemoryStore;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::engine::TransferEngine;

    fn id(raw: i64) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    fn setup() -> (AccountAdmin, TransferEngine) {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        (
            AccountAdmin::new(Arc::clone(&store)),
            TransferEngine::new(store),
        )
    }

    #[tokio::test]
    async fn create_then_get() {
        let (admin, _) = setup();
        let balance = Amount::try_from(dec!(12.5)).unwrap();

        let created = admin.create(id(7), balance).await.unwrap();
        assert_eq!(created.balance, balance);

        let fetched = admin.get(id(7)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected_and_keeps_balance() {
        let (admin, _) = setup();
        admin
            .create(id(1), Amount::try_from(dec!(5)).unwrap())
            .await
            .unwrap();

        let err = admin.create(id(1), Amount::zero()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            admin.get(id(1)).await.unwrap().balance,
            Amount::try_from(dec!(5)).unwrap()
        );
    }

    #[tokio::test]
    async fn missing_lookups() {
        let (admin, _) = setup();

        assert_eq!(
            admin.get(id(3)).await.unwrap_err().kind(),
            ErrorKind::AccountNotFound
        );
        assert_eq!(
            admin
                .get_transaction(TransactionId::new(3).unwrap())
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::TransactionNotFound
        );
        assert_eq!(
            admin
                .list_transactions(id(3), None, 0)
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::AccountNotFound
        );
    }

    #[tokio::test]
    async fn list_clamps_limit_and_pages() {
        let (admin, engine) = setup();
        admin
            .create(id(1), Amount::try_from(dec!(1000)).unwrap())
            .await
            .unwrap();
        admin.create(id(2), Amount::zero()).await.unwrap();

        let one = Amount::try_from(dec!(1)).unwrap();
        for _ in 0..3 {
            engine.execute(id(1), id(2), one).await.unwrap();
        }

        let all = admin.list_transactions(id(2), None, 0).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id > w[1].id));

        let zero_limit = admin.list_transactions(id(2), Some(0), 0).await.unwrap();
        assert_eq!(zero_limit.len(), 1);
        assert_eq!(zero_limit[0].id, all[0].id);

        let second_page = admin.list_transactions(id(1), Some(2), 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, all[2].id);

        let tx = admin.get_transaction(all[1].id).await.unwrap();
        assert_eq!(tx, all[1]);
    }
}
