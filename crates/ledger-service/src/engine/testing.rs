//! Instrumented store for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledger_core::{
    Account, AccountId, Amount, NewTransaction, Transaction, TransactionId, TransactionStatus,
};
use ledger_store::{LedgerStore, MemoryStore, Result, StoreError, UnitOfWork};

/// Where a [`RecordingStore`] unit of work should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertTransaction,
    SetBalance,
    UpdateStatus,
    Commit,
}

/// Wraps a [`MemoryStore`], counting units of work, recording lock order,
/// and optionally failing at one [`FailPoint`].
pub struct RecordingStore {
    inner: MemoryStore,
    fail_at: Option<FailPoint>,
    begins: AtomicUsize,
    locks: Arc<Mutex<Vec<AccountId>>>,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_at: None,
            begins: AtomicUsize::new(0),
            locks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_at(inner: MemoryStore, fail_at: FailPoint) -> Self {
        Self {
            fail_at: Some(fail_at),
            ..Self::new(inner)
        }
    }

    pub fn begin_count(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn lock_order(&self) -> Vec<AccountId> {
        self.locks.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerStore for RecordingStore {
    fn backend(&self) -> &'static str {
        "recording"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingUnit {
            inner: self.inner.begin().await?,
            fail_at: self.fail_at,
            locks: Arc::clone(&self.locks),
        }))
    }

    async fn create_account(&self, id: AccountId, balance: Amount) -> Result<Account> {
        self.inner.create_account(id, balance).await
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.inner.get_account(id).await
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.inner.get_transaction(id).await
    }

    async fn list_transactions_by_account(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        self.inner
            .list_transactions_by_account(account_id, limit, offset)
            .await
    }

    async fn health_check(&self) -> Result<()> {
        self.inner.health_check().await
    }
}

struct RecordingUnit {
    inner: Box<dyn UnitOfWork>,
    fail_at: Option<FailPoint>,
    locks: Arc<Mutex<Vec<AccountId>>>,
}

impl RecordingUnit {
    fn trip(&self, point: FailPoint) -> Result<()> {
        if self.fail_at == Some(point) {
            return Err(StoreError::Conflict(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for RecordingUnit {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        self.locks.lock().unwrap().push(id);
        self.inner.lock_account(id).await
    }

    async fn set_account_balance(&mut self, id: AccountId, balance: Amount) -> Result<()> {
        self.inner.set_account_balance(id, balance).await?;
        self.trip(FailPoint::SetBalance)
    }

    async fn insert_transaction(&mut self, new: &NewTransaction) -> Result<Transaction> {
        self.trip(FailPoint::InsertTransaction)?;
        self.inner.insert_transaction(new).await
    }

    async fn update_transaction_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<()> {
        self.trip(FailPoint::UpdateStatus)?;
        self.inner.update_transaction_status(id, status).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if let Err(e) = self.trip(FailPoint::Commit) {
            self.inner.rollback().await?;
            return Err(e);
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }
}
