//! Account types for the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount};

/// A ledger account.
///
/// The balance is only ever changed by a transfer, which holds the row lock for
/// the duration of its unit of work. Accounts are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account ID (chosen by the creator).
    pub id: AccountId,

    /// Current balance. Never negative.
    pub balance: Amount,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the balance was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the given opening balance.
    #[must_use]
    pub fn new(id: AccountId, balance: Amount) -> Self {
        let now = Utc::now();
        Self {
            id,
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can fund a transfer of `amount`.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_keeps_opening_balance() {
        let id = AccountId::new(1).unwrap();
        let account = Account::new(id, "100".parse().unwrap());
        assert_eq!(account.balance.to_string(), "100.0000000000");
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn account_sufficient_funds() {
        let id = AccountId::new(1).unwrap();
        let account = Account::new(id, "10.5".parse().unwrap());

        assert!(account.has_sufficient_funds("10".parse().unwrap()));
        assert!(account.has_sufficient_funds("10.5".parse().unwrap()));
        assert!(!account.has_sufficient_funds("10.5000000001".parse().unwrap()));
    }
}
