//! HTTP request handlers.

pub mod accounts;
pub mod health;
pub mod transactions;

use ledger_core::{AccountId, LedgerError, TransactionId};

use crate::error::ApiError;

/// Parse an account ID from a path segment.
fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    Ok(raw.parse().map_err(LedgerError::from)?)
}

/// Parse a transaction ID from a path segment.
fn parse_transaction_id(raw: &str) -> Result<TransactionId, ApiError> {
    Ok(raw.parse().map_err(LedgerError::from)?)
}
