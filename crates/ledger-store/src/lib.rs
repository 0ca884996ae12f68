//! Storage layer for the ledger.
//!
//! This crate provides persistent storage for accounts and transactions behind
//! two traits:
//!
//! - [`LedgerStore`]: the shared handle. Point reads and single-statement writes
//!   run directly against it; [`LedgerStore::begin`] opens a unit of work.
//! - [`UnitOfWork`]: a bounded sequence of operations that commits or rolls back
//!   as a whole. Rows read through [`UnitOfWork::lock_account`] stay exclusively
//!   locked until the unit ends.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, using `SELECT ... FOR UPDATE` row locks.
//! - [`MemoryStore`]: in-process tables with per-row async mutexes. Plain reads
//!   see the last committed value and never wait on row locks, the same way
//!   PostgreSQL readers behave.
//!
//! # Rollback guarantee
//!
//! A unit of work that is dropped without [`UnitOfWork::commit`] is rolled
//! back, so early returns, panics and cancelled futures never leave locks held
//! or partial writes visible.
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{AccountId, NewTransaction, TransactionStatus};
//! use ledger_store::{LedgerStore, MemoryStore};
//!
//! # async fn example() -> ledger_store::Result<()> {
//! let store = MemoryStore::new();
//! let a = AccountId::new(1).unwrap();
//! let b = AccountId::new(2).unwrap();
//! store.create_account(a, "100".parse().unwrap()).await?;
//! store.create_account(b, "0".parse().unwrap()).await?;
//!
//! let mut unit = store.begin().await?;
//! let source = unit.lock_account(a).await?.expect("exists");
//! let tx = unit
//!     .insert_transaction(&NewTransaction::pending(a, b, "1".parse().unwrap()))
//!     .await?;
//! unit.update_transaction_status(tx.id, TransactionStatus::Completed).await?;
//! unit.commit().await?;
//! # let _ = source;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::{PgStore, PoolSettings};

use async_trait::async_trait;
use ledger_core::{
    Account, AccountId, Amount, NewTransaction, Transaction, TransactionId, TransactionStatus,
};

/// The storage trait defining operations outside a unit of work.
///
/// Implementations are shared between request handlers, so they must be
/// `Send + Sync`; each call borrows a connection only for its own duration.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short name of the backend, for logs and health output.
    fn backend(&self) -> &'static str;

    /// Open a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection could be obtained.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AccountExists` if the ID is taken.
    async fn create_account(&self, id: AccountId, balance: Amount) -> Result<Account>;

    /// Get an account by ID (last committed state, no locking).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// List transactions where the account is source or destination, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_transactions_by_account(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot serve requests.
    async fn health_check(&self) -> Result<()>;
}

/// A unit of work: every write made through it becomes durable on
/// [`commit`](UnitOfWork::commit) or is discarded entirely.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Read an account and hold an exclusive lock on its row until the unit ends.
    ///
    /// Blocks while another unit of work holds the same row. Locking a row the
    /// unit already holds returns its current (possibly uncommitted) state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the lock wait times out.
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>>;

    /// Overwrite an account balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AccountNotFound` if the account does not exist.
    async fn set_account_balance(&mut self, id: AccountId, balance: Amount) -> Result<()>;

    /// Insert a transaction row and return it with its assigned ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AccountNotFound`, naming the missing side, if either
    /// referenced account does not exist.
    async fn insert_transaction(&mut self, new: &NewTransaction) -> Result<Transaction>;

    /// Change a transaction's status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TransactionNotFound` if the transaction does not exist,
    /// or `StoreError::InvalidTransition` if its current status cannot move to
    /// `status`.
    async fn update_transaction_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<()>;

    /// Make every write durable and release all locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is applied in that case.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write and release all locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not be told to roll back. The
    /// writes are discarded regardless.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
