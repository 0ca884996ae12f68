//! Transaction records for the ledger.
//!
//! Every transfer leaves exactly one transaction row behind. The row is inserted
//! as [`TransactionStatus::Pending`] inside the transfer's unit of work and
//! promoted to [`TransactionStatus::Completed`] just before commit; if the unit
//! of work aborts, the row disappears with it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, TransactionId};

/// A recorded fund transfer between two accounts.
///
/// Immutable except for `status` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned ID.
    pub id: TransactionId,

    /// Account the funds were taken from.
    pub source_account_id: AccountId,

    /// Account the funds were moved to.
    pub destination_account_id: AccountId,

    /// Amount moved. Always strictly positive.
    pub amount: Amount,

    /// Current status.
    pub status: TransactionStatus,

    /// When the row was inserted.
    pub created_at: DateTime<Utc>,

    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether `account_id` is either side of this transaction.
    #[must_use]
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.source_account_id == account_id || self.destination_account_id == account_id
    }
}

/// The fields a caller supplies when inserting a transaction row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Account the funds are taken from.
    pub source_account_id: AccountId,
    /// Account the funds are moved to.
    pub destination_account_id: AccountId,
    /// Amount to move.
    pub amount: Amount,
    /// Initial status.
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// A pending transfer record.
    #[must_use]
    pub fn pending(source: AccountId, destination: AccountId, amount: Amount) -> Self {
        Self {
            source_account_id: source,
            destination_account_id: destination,
            amount,
            status: TransactionStatus::Pending,
        }
    }
}

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Inserted, funds not yet moved.
    Pending,

    /// Funds moved and committed.
    Completed,

    /// Reserved for rejected transfers; no code path currently persists it,
    /// because an aborted unit of work leaves no row at all.
    Failed,
}

impl TransactionStatus {
    /// The value stored in the `status` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether a row in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A status string that is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction status: {0:?}")]
pub struct UnknownStatus(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_column_value() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
        assert!("done".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn only_pending_rows_move() {
        use TransactionStatus::{Completed, Failed, Pending};

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TransactionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn pending_constructor() {
        let a = AccountId::new(1).unwrap();
        let b = AccountId::new(2).unwrap();
        let new = NewTransaction::pending(a, b, "5".parse().unwrap());
        assert_eq!(new.status, TransactionStatus::Pending);
        assert_eq!(new.source_account_id, a);
        assert_eq!(new.destination_account_id, b);
    }
}
