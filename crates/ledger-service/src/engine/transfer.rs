//! The fund-transfer engine.
//!
//! A transfer runs as one unit of work:
//!
//! 1. lock both account rows in ascending ID order,
//! 2. check existence and sufficiency of funds,
//! 3. insert the transaction as `pending`,
//! 4. write both new balances,
//! 5. mark the transaction `completed`,
//! 6. commit.
//!
//! Any failure rolls the whole unit back, so no partial balance change or
//! orphaned `pending` row is ever visible. Locking in a single global order
//! means two transfers over the same pair of accounts, in either direction,
//! can never wait on each other in a cycle.

use std::sync::Arc;

use ledger_core::{
    Account, AccountId, Amount, LedgerError, NewTransaction, Result, Transaction,
    TransactionStatus,
};
use ledger_store::{LedgerStore, UnitOfWork};

/// Executes atomic transfers against a shared store.
///
/// The engine holds no state of its own beyond the store handle; clones share it.
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn LedgerStore>,
}

impl TransferEngine {
    /// Create an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Move `amount` from `source` to `destination`.
    ///
    /// Returns the completed transaction record.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the accounts are equal or the amount is zero
    ///   (checked before the store is touched), or if the destination balance
    ///   would leave the representable range.
    /// - `AccountNotFound` if either account does not exist.
    /// - `InsufficientFunds` if the source balance is below `amount`.
    /// - `Conflict` for any store failure; nothing was applied and the caller
    ///   may retry the whole transfer.
    pub async fn execute(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<Transaction> {
        if source == destination {
            return Err(LedgerError::InvalidArgument(
                "source and destination accounts must differ".into(),
            ));
        }
        if !amount.is_positive() {
            return Err(LedgerError::InvalidArgument(
                "amount must be greater than zero".into(),
            ));
        }

        let mut unit = self.store.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open unit of work");
            LedgerError::from(e)
        })?;

        match apply(unit.as_mut(), source, destination, amount).await {
            Ok(transaction) => {
                unit.commit().await.map_err(|e| {
                    tracing::error!(
                        transaction_id = %transaction.id,
                        error = %e,
                        "Transfer commit failed"
                    );
                    LedgerError::from(e)
                })?;

                tracing::info!(
                    transaction_id = %transaction.id,
                    source = %source,
                    destination = %destination,
                    amount = %amount,
                    "Transfer completed"
                );
                Ok(transaction)
            }
            Err(err) => {
                if let Err(rollback_err) = unit.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback reported an error");
                }

                if err.is_retryable() {
                    tracing::error!(
                        source = %source,
                        destination = %destination,
                        error = %err,
                        "Transfer aborted"
                    );
                } else {
                    tracing::debug!(
                        source = %source,
                        destination = %destination,
                        amount = %amount,
                        reason = %err,
                        "Transfer rejected"
                    );
                }
                Err(err)
            }
        }
    }
}

/// The locked part of a transfer. The caller owns commit and rollback.
async fn apply(
    unit: &mut dyn UnitOfWork,
    source: AccountId,
    destination: AccountId,
    amount: Amount,
) -> Result<Transaction> {
    let (source_account, destination_account) = lock_pair(unit, source, destination).await?;

    if !source_account.has_sufficient_funds(amount) {
        return Err(LedgerError::InsufficientFunds {
            account_id: source,
            balance: source_account.balance,
            required: amount,
        });
    }

    let pending = unit
        .insert_transaction(&NewTransaction::pending(source, destination, amount))
        .await?;

    let new_source_balance = source_account.balance.checked_sub(amount).ok_or(
        LedgerError::InsufficientFunds {
            account_id: source,
            balance: source_account.balance,
            required: amount,
        },
    )?;
    let new_destination_balance = destination_account
        .balance
        .checked_add(amount)
        .ok_or_else(|| {
            LedgerError::InvalidArgument(format!(
                "balance of account {destination} would exceed the maximum"
            ))
        })?;

    unit.set_account_balance(source, new_source_balance).await?;
    unit.set_account_balance(destination, new_destination_balance)
        .await?;
    unit.update_transaction_status(pending.id, TransactionStatus::Completed)
        .await?;

    Ok(Transaction {
        status: TransactionStatus::Completed,
        ..pending
    })
}

/// Lock both rows in ascending ID order and return them as `(source, destination)`.
async fn lock_pair(
    unit: &mut dyn UnitOfWork,
    source: AccountId,
    destination: AccountId,
) -> Result<(Account, Account)> {
    let (first, second) = if source < destination {
        (source, destination)
    } else {
        (destination, source)
    };

    let first_account = unit
        .lock_account(first)
        .await?
        .ok_or(LedgerError::AccountNotFound { account_id: first })?;
    let second_account = unit
        .lock_account(second)
        .await?
        .ok_or(LedgerError::AccountNotFound { account_id: second })?;

    if first == source {
        Ok((first_account, second_account))
    } else {
        Ok((second_account, first_account))
    }
}
