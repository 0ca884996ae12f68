//! In-memory storage implementation.
//!
//! Each account row owns an async mutex standing in for the database row lock
//! and a committed snapshot behind a `RwLock`. A unit of work keeps the row
//! guards it acquired together with its staged changes; committing copies the
//! staged state into the snapshots, dropping the unit simply releases the guards.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ledger_core::{
    Account, AccountId, Amount, NewTransaction, Transaction, TransactionId, TransactionStatus,
};

use crate::error::{Result, StoreError};
use crate::{LedgerStore, UnitOfWork};

/// One account row.
struct AccountSlot {
    row_lock: Arc<Mutex<()>>,
    committed: RwLock<Account>,
}

#[derive(Default)]
struct Tables {
    accounts: RwLock<BTreeMap<AccountId, Arc<AccountSlot>>>,
    transactions: RwLock<BTreeMap<TransactionId, Transaction>>,
    last_transaction_id: AtomicI64,
}

/// In-memory ledger store.
///
/// Cloning is cheap and every clone shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: AccountId) -> Result<Option<Arc<AccountSlot>>> {
        Ok(read(&self.tables.accounts)?.get(&id).cloned())
    }

    /// Allocate the next transaction ID. Like a database sequence, IDs handed
    /// to units of work that later roll back are not reused.
    fn next_transaction_id(&self) -> Result<TransactionId> {
        let raw = self.tables.last_transaction_id.fetch_add(1, Ordering::SeqCst) + 1;
        TransactionId::new(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork {
            store: self.clone(),
            locked: BTreeMap::new(),
            staged_transactions: BTreeMap::new(),
        }))
    }

    async fn create_account(&self, id: AccountId, balance: Amount) -> Result<Account> {
        let mut accounts = write(&self.tables.accounts)?;
        if accounts.contains_key(&id) {
            return Err(StoreError::AccountExists(id));
        }

        let account = Account::new(id, balance);
        accounts.insert(
            id,
            Arc::new(AccountSlot {
                row_lock: Arc::new(Mutex::new(())),
                committed: RwLock::new(account.clone()),
            }),
        );
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let Some(slot) = self.slot(id)? else {
            return Ok(None);
        };
        let account = read(&slot.committed)?.clone();
        Ok(Some(account))
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        Ok(read(&self.tables.transactions)?.get(&id).cloned())
    }

    async fn list_transactions_by_account(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let transactions = read(&self.tables.transactions)?;
        Ok(transactions
            .values()
            .rev()
            .filter(|tx| tx.involves(account_id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        read(&self.tables.accounts).map(|_| ())
    }
}

/// A row held by a unit of work, with its uncommitted state.
struct LockedRow {
    slot: Arc<AccountSlot>,
    _guard: OwnedMutexGuard<()>,
    current: Account,
    dirty: bool,
}

/// Unit of work over a [`MemoryStore`].
pub struct MemoryUnitOfWork {
    store: MemoryStore,
    locked: BTreeMap<AccountId, LockedRow>,
    staged_transactions: BTreeMap<TransactionId, Transaction>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        if let Some(row) = self.locked.get(&id) {
            return Ok(Some(row.current.clone()));
        }

        let Some(slot) = self.store.slot(id)? else {
            return Ok(None);
        };
        let guard = Arc::clone(&slot.row_lock).lock_owned().await;
        let current = read(&slot.committed)?.clone();

        tracing::trace!(account_id = %id, "Row lock acquired");
        self.locked.insert(
            id,
            LockedRow {
                slot,
                _guard: guard,
                current: current.clone(),
                dirty: false,
            },
        );
        Ok(Some(current))
    }

    async fn set_account_balance(&mut self, id: AccountId, balance: Amount) -> Result<()> {
        if !self.locked.contains_key(&id) && self.lock_account(id).await?.is_none() {
            return Err(StoreError::AccountNotFound(id));
        }
        let row = self
            .locked
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;

        row.current.balance = balance;
        row.current.updated_at = Utc::now();
        row.dirty = true;
        Ok(())
    }

    async fn insert_transaction(&mut self, new: &NewTransaction) -> Result<Transaction> {
        for account_id in [new.source_account_id, new.destination_account_id] {
            if !self.locked.contains_key(&account_id) && self.store.slot(account_id)?.is_none() {
                return Err(StoreError::AccountNotFound(account_id));
            }
        }

        let now = Utc::now();
        let transaction = Transaction {
            id: self.store.next_transaction_id()?,
            source_account_id: new.source_account_id,
            destination_account_id: new.destination_account_id,
            amount: new.amount,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.staged_transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<()> {
        let mut transaction = match self.staged_transactions.get(&id) {
            Some(staged) => staged.clone(),
            None => read(&self.store.tables.transactions)?
                .get(&id)
                .cloned()
                .ok_or(StoreError::TransactionNotFound(id))?,
        };

        if !transaction.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                transaction_id: id,
                from: transaction.status,
                to: status,
            });
        }
        transaction.status = status;
        transaction.updated_at = Utc::now();
        self.staged_transactions.insert(id, transaction);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            store,
            locked,
            staged_transactions,
        } = *self;

        let mut transactions = write(&store.tables.transactions)?;
        for row in locked.values().filter(|row| row.dirty) {
            *write(&row.slot.committed)? = row.current.clone();
        }
        transactions.extend(staged_transactions);
        drop(transactions);

        // Row guards are released here, after the new state is visible.
        drop(locked);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        tracing::trace!(
            rows = self.locked.len(),
            transactions = self.staged_transactions.len(),
            "Discarding unit of work"
        );
        Ok(())
    }
}
