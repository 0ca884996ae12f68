//! Error types for the ledger.
//!
//! Callers branch on [`LedgerError::kind`], never on the message text.

use crate::amount::AmountError;
use crate::ids::IdError;
use crate::{AccountId, Amount, TransactionId};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input, rejected before touching the store.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Account not found.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account ID that was not found.
        account_id: AccountId,
    },

    /// Account already exists.
    #[error("account already exists: {account_id}")]
    AccountAlreadyExists {
        /// The account ID that already exists.
        account_id: AccountId,
    },

    /// Transaction not found.
    #[error("transaction not found: {transaction_id}")]
    TransactionNotFound {
        /// The transaction ID that was not found.
        transaction_id: TransactionId,
    },

    /// Source balance is below the requested amount.
    #[error("insufficient funds in account {account_id}: balance={balance}, required={required}")]
    InsufficientFunds {
        /// The account that would have been debited.
        account_id: AccountId,
        /// Its balance at the time of the check.
        balance: Amount,
        /// The requested amount.
        required: Amount,
    },

    /// Store-level failure inside a unit of work (lock timeout, serialization
    /// failure, lost connection, failed commit). Nothing was applied; the whole
    /// operation may be retried.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`LedgerError::InvalidArgument`].
    InvalidArgument,
    /// See [`LedgerError::AccountNotFound`].
    AccountNotFound,
    /// See [`LedgerError::AccountAlreadyExists`].
    AlreadyExists,
    /// See [`LedgerError::TransactionNotFound`].
    TransactionNotFound,
    /// See [`LedgerError::InsufficientFunds`].
    InsufficientFunds,
    /// See [`LedgerError::Conflict`].
    Conflict,
}

impl LedgerError {
    /// The kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            Self::AccountAlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::TransactionNotFound { .. } => ErrorKind::TransactionNotFound,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }

    /// Whether retrying the whole operation from scratch may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict)
    }
}

impl From<IdError> for LedgerError {
    fn from(err: IdError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
