//! Error types for ledger storage.

use ledger_core::{AccountId, LedgerError, TransactionId, TransactionStatus};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLSTATE codes that mean "the unit of work lost a race, try again".
const RETRYABLE_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "57014", // query_canceled (statement_timeout)
];

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// The database rejected the unit of work because of concurrent activity
    /// (serialization failure, deadlock, lock timeout).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be decoded into a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// No account with this ID.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// No transaction with this ID.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// An account with this ID already exists.
    #[error("account already exists: {0}")]
    AccountExists(AccountId),

    /// A status change that [`TransactionStatus::can_transition_to`] forbids.
    #[error("transaction {transaction_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The transaction being updated.
        transaction_id: TransactionId,
        /// Its stored status.
        from: TransactionStatus,
        /// The requested status.
        to: TransactionStatus,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db)
                if db
                    .code()
                    .is_some_and(|code| RETRYABLE_SQLSTATES.iter().any(|c| *c == code)) =>
            {
                Self::Conflict(err.to_string())
            }
            sqlx::Error::PoolTimedOut => Self::Conflict(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Corrupt(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(account_id) => Self::AccountNotFound { account_id },
            StoreError::TransactionNotFound(transaction_id) => {
                Self::TransactionNotFound { transaction_id }
            }
            StoreError::AccountExists(account_id) => Self::AccountAlreadyExists { account_id },
            other => Self::Conflict(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::ErrorKind;

    fn account(raw: i64) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    #[test]
    fn not_found_maps_to_typed_ledger_error() {
        let err: LedgerError = StoreError::AccountNotFound(account(7)).into();
        assert!(matches!(
            err,
            LedgerError::AccountNotFound { account_id } if account_id.get() == 7
        ));

        let missing = TransactionId::new(3).unwrap();
        let err: LedgerError = StoreError::TransactionNotFound(missing).into();
        assert!(matches!(
            err,
            LedgerError::TransactionNotFound { transaction_id } if transaction_id.get() == 3
        ));
    }

    #[test]
    fn already_exists_maps_to_typed_ledger_error() {
        let err: LedgerError = StoreError::AccountExists(account(5)).into();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(!err.is_retryable());
    }

    #[test]
    fn invalid_transition_is_not_reported_as_not_found() {
        let err: LedgerError = StoreError::InvalidTransition {
            transaction_id: TransactionId::new(4).unwrap(),
            from: TransactionStatus::Completed,
            to: TransactionStatus::Pending,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("cannot move from completed to pending"));
    }

    #[test]
    fn infrastructure_failures_are_retryable_conflicts() {
        for err in [
            StoreError::Database("connection reset".into()),
            StoreError::Conflict("deadlock detected".into()),
            StoreError::Corrupt("bad status".into()),
        ] {
            let err: LedgerError = err.into();
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn pool_timeout_is_a_conflict() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
